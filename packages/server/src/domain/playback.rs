//! 再生状態（PlaybackState）と、その遷移規則
//!
//! `PlaybackState` は「`last_updated_at` 時点での位置」と「再生中フラグ」の
//! チェックポイントであり、時間とともに増加する値を保持しない。
//! 任意時刻の位置は [`PlaybackState::position_at`] で導出する。
//!
//! すべての遷移は新しい状態を返す純粋関数で、`version` を 1 つ進める。
//! `version` はストア側の楽観的並行性制御に使われる。

use serde::{Deserialize, Serialize};

use super::{error::RoomError, value_object::Timestamp};

/// メディアの種類（クライアントの描画方法にのみ影響する）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    RawFile,
    AdaptiveStream,
    EmbeddedPlatform,
}

/// 再生対象のメディア
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: String,
    pub kind: SourceKind,
}

impl MediaSource {
    pub fn new(url: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            url: url.into().trim().to_string(),
            kind,
        }
    }

    /// メディア未ロード
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// ホストからの再生操作
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackIntent {
    Play,
    Pause { position_seconds: f64 },
    Seek { position_seconds: f64 },
    ChangeSource(MediaSource),
}

impl PlaybackIntent {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackIntent::Play => "play",
            PlaybackIntent::Pause { .. } => "pause",
            PlaybackIntent::Seek { .. } => "seek",
            PlaybackIntent::ChangeSource(_) => "changeSource",
        }
    }

    /// 現在の状態にこの操作を適用した次の状態を返す
    pub fn apply(&self, state: &PlaybackState, now: Timestamp) -> Result<PlaybackState, RoomError> {
        match self {
            PlaybackIntent::Play => Ok(state.play(now)),
            PlaybackIntent::Pause { position_seconds } => state.pause(*position_seconds, now),
            PlaybackIntent::Seek { position_seconds } => state.seek(*position_seconds, now),
            PlaybackIntent::ChangeSource(source) => Ok(state.change_source(source.clone(), now)),
        }
    }
}

/// Room ごとに 1 つだけ存在する、サーバー権威の再生状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub source: MediaSource,
    pub position_seconds: f64,
    pub is_playing: bool,
    pub last_updated_at: Timestamp,
    pub version: u64,
}

/// 負の位置は 0 に丸め、NaN / 無限大は拒否する
fn sanitize_position(position_seconds: f64) -> Result<f64, RoomError> {
    if !position_seconds.is_finite() {
        return Err(RoomError::InvalidPosition(position_seconds));
    }
    Ok(position_seconds.max(0.0))
}

impl PlaybackState {
    /// メディア未ロード・停止中の初期状態
    pub fn empty(now: Timestamp) -> Self {
        Self {
            source: MediaSource::default(),
            position_seconds: 0.0,
            is_playing: false,
            last_updated_at: now,
            version: 0,
        }
    }

    /// `now` 時点での再生位置（秒）
    ///
    /// 停止中はチェックポイントの位置をそのまま返す。時計が巻き戻った場合は
    /// 経過時間を 0 として扱う。
    pub fn position_at(&self, now: Timestamp) -> f64 {
        if !self.is_playing {
            return self.position_seconds;
        }
        let elapsed_ms = (now.value() - self.last_updated_at.value()).max(0);
        self.position_seconds + elapsed_ms as f64 / 1000.0
    }

    fn next(&self, position_seconds: f64, is_playing: bool, now: Timestamp) -> Self {
        Self {
            source: self.source.clone(),
            position_seconds,
            is_playing,
            last_updated_at: now,
            version: self.version + 1,
        }
    }

    /// 再生開始。再生中に呼ばれた場合は経過分をチェックポイントしてから続ける。
    pub fn play(&self, now: Timestamp) -> Self {
        let position = if self.is_playing {
            self.position_at(now)
        } else {
            self.position_seconds
        };
        self.next(position, true, now)
    }

    /// 一時停止。位置はホストが報告した値で上書きする。
    pub fn pause(&self, reported_position: f64, now: Timestamp) -> Result<Self, RoomError> {
        let position = sanitize_position(reported_position)?;
        Ok(self.next(position, false, now))
    }

    /// シーク。再生中フラグは変えない。
    pub fn seek(&self, target_position: f64, now: Timestamp) -> Result<Self, RoomError> {
        let position = sanitize_position(target_position)?;
        Ok(self.next(position, self.is_playing, now))
    }

    /// メディアの差し替え。位置 0・停止状態にリセットする。
    pub fn change_source(&self, source: MediaSource, now: Timestamp) -> Self {
        Self {
            source,
            position_seconds: 0.0,
            is_playing: false,
            last_updated_at: now,
            version: self.version + 1,
        }
    }

    /// 定期リコンシリエーション。再生中なら経過時間を位置に繰り入れる。
    ///
    /// 停止中は変更がないため `None` を返す。
    pub fn reconcile(&self, now: Timestamp) -> Option<Self> {
        if !self.is_playing {
            return None;
        }
        Some(self.next(self.position_at(now), true, now))
    }
}
