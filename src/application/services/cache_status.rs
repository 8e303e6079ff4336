use serde::{Deserialize, Serialize};

/// 一括取得の状態遷移: `Idle → Loading → {Succeeded | Failed}`。
/// どの状態からでも再取得で `Loading` に戻る
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}
