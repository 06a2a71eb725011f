//! Drift corrector
//!
//! サーバーから受け取った権威ある再生状態と、サーバー時計との差（オフセット）から
//! 「今あるべき再生位置」を推定し、ローカルプレイヤーを少しずつそこへ寄せる。
//!
//! - 小さなズレは無視する
//! - 中程度のズレは再生速度を ±数% 変えて、目に見えるジャンプなしに詰める
//! - 大きなズレは、バッファが十分でクールダウンを過ぎていればハードシークする
//! - バッファリング中は一切補正しない

use sajiki_server::infrastructure::dto::websocket::PlaybackStateDto;

use crate::player::{MediaPlayer, NORMAL_RATE};

/// 補正のしきい値
#[derive(Debug, Clone, PartialEq)]
pub struct DriftConfig {
    /// これ未満のズレ（秒）は補正しない
    pub sync_threshold: f64,
    /// これ以上のズレ（秒）はハードシークの対象
    pub seek_threshold: f64,
    /// 速度調整の幅（0.08 なら 1.08 倍 / 0.92 倍）
    pub rate_nudge: f64,
    /// ハードシーク同士の最小間隔（ミリ秒）
    pub hard_seek_cooldown_ms: i64,
    /// ハードシークに必要な先読み量（秒）
    pub min_buffer_seconds: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            sync_threshold: 0.3,
            seek_threshold: 1.5,
            rate_nudge: 0.08,
            hard_seek_cooldown_ms: 2_000,
            min_buffer_seconds: 1.0,
        }
    }
}

/// 1 回の評価で行った位置補正
#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    /// まだ再生状態を受け取っていない
    Idle,
    /// バッファリング中のため見送った
    Suspended,
    /// 許容範囲内
    InSync { drift: f64 },
    /// 再生速度を調整した
    Nudge { drift: f64, rate: f64 },
    /// 期待位置へシークした
    HardSeek { drift: f64, position: f64 },
}

/// クライアント 1 つ分のドリフト補正
#[derive(Debug, Clone)]
pub struct DriftCorrector {
    config: DriftConfig,
    /// 最後に採用した再生状態
    state: Option<PlaybackStateDto>,
    /// local_now - server_time（ミリ秒）
    server_clock_offset_ms: i64,
    last_hard_seek_at_ms: Option<i64>,
}

impl DriftCorrector {
    pub fn new(config: DriftConfig) -> Self {
        Self {
            config,
            state: None,
            server_clock_offset_ms: 0,
            last_hard_seek_at_ms: None,
        }
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&PlaybackStateDto> {
        self.state.as_ref()
    }

    pub fn server_clock_offset_ms(&self) -> i64 {
        self.server_clock_offset_ms
    }

    /// 新しい Room に入り直したときに、以前の状態を忘れる
    pub fn reset(&mut self) {
        self.state = None;
        self.last_hard_seek_at_ms = None;
    }

    /// サーバーからの再生状態を取り込む
    ///
    /// 時計のオフセットは毎回更新する。再生状態は `(last_updated_at_ms, version)` が
    /// 直前に採用したものより新しい場合だけ採用し、採用したかどうかを返す。
    pub fn observe(
        &mut self,
        playback: &PlaybackStateDto,
        server_time_ms: i64,
        local_now_ms: i64,
    ) -> bool {
        self.server_clock_offset_ms = local_now_ms - server_time_ms;

        let is_newer = self.state.as_ref().is_none_or(|current| {
            (playback.last_updated_at_ms, playback.version)
                > (current.last_updated_at_ms, current.version)
        });
        if !is_newer {
            tracing::debug!(
                "Ignoring stale playback state (version {}, updated at {})",
                playback.version,
                playback.last_updated_at_ms
            );
            return false;
        }

        self.state = Some(playback.clone());
        true
    }

    /// サーバー時刻の推定値
    pub fn estimated_server_now(&self, local_now_ms: i64) -> i64 {
        local_now_ms - self.server_clock_offset_ms
    }

    /// 今あるべき再生位置
    pub fn expected_position(&self, local_now_ms: i64) -> Option<f64> {
        let state = self.state.as_ref()?;
        if !state.is_playing {
            return Some(state.position_seconds);
        }
        let elapsed_ms = self.estimated_server_now(local_now_ms) - state.last_updated_at_ms;
        Some(state.position_seconds + elapsed_ms as f64 / 1000.0)
    }

    /// ローカルプレイヤーを評価して補正する
    ///
    /// メディアと再生／停止の食い違いは毎回そろえる。位置の補正はバッファリング中は行わない。
    pub fn evaluate(&mut self, player: &mut dyn MediaPlayer, local_now_ms: i64) -> Correction {
        let Some(state) = self.state.clone() else {
            return Correction::Idle;
        };

        if player.source() != state.source_url {
            player.load(&state.source_url);
        }
        if state.source_url.is_empty() {
            return Correction::Idle;
        }
        if state.is_playing && !player.is_playing() {
            player.play();
        } else if !state.is_playing && player.is_playing() {
            player.pause();
        }

        if player.is_buffering() {
            return Correction::Suspended;
        }

        let Some(expected) = self.expected_position(local_now_ms) else {
            return Correction::Idle;
        };
        let drift = player.position() - expected;
        let magnitude = drift.abs();

        if magnitude < self.config.sync_threshold {
            if player.rate() != NORMAL_RATE {
                player.set_rate(NORMAL_RATE);
            }
            return Correction::InSync { drift };
        }

        // 停止中は速度を変えても位置が動かないので、そのまま合わせる
        if !state.is_playing {
            return self.hard_seek(player, drift, expected, local_now_ms);
        }

        if magnitude >= self.config.seek_threshold && self.can_hard_seek(player, local_now_ms) {
            return self.hard_seek(player, drift, expected, local_now_ms);
        }

        // 遅れていれば速く、進んでいれば遅く
        let rate = if drift < 0.0 {
            NORMAL_RATE + self.config.rate_nudge
        } else {
            NORMAL_RATE - self.config.rate_nudge
        };
        if player.rate() != rate {
            player.set_rate(rate);
        }
        Correction::Nudge { drift, rate }
    }

    fn can_hard_seek(&self, player: &dyn MediaPlayer, local_now_ms: i64) -> bool {
        let cooled_down = self
            .last_hard_seek_at_ms
            .is_none_or(|at| local_now_ms - at >= self.config.hard_seek_cooldown_ms);
        cooled_down && player.buffered_ahead() >= self.config.min_buffer_seconds
    }

    fn hard_seek(
        &mut self,
        player: &mut dyn MediaPlayer,
        drift: f64,
        expected: f64,
        local_now_ms: i64,
    ) -> Correction {
        let position = expected.max(0.0);
        player.seek(position);
        player.set_rate(NORMAL_RATE);
        self.last_hard_seek_at_ms = Some(local_now_ms);
        tracing::debug!("Hard seek to {:.3}s (drift {:+.3}s)", position, drift);
        Correction::HardSeek { drift, position }
    }
}

impl Default for DriftCorrector {
    fn default() -> Self {
        Self::new(DriftConfig::default())
    }
}
