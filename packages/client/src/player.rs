//! Local media player abstraction.
//!
//! The CLI client has no video output, so `SimulatedPlayer` plays a virtual
//! timeline against a `Clock`. Stalls and buffer levels can be set by hand to
//! exercise the drift corrector.

use std::sync::Arc;

use sajiki_shared::time::Clock;

/// 通常の再生速度
pub const NORMAL_RATE: f64 = 1.0;

/// ローカルプレイヤーの操作
pub trait MediaPlayer: Send {
    /// 現在の再生位置（秒）
    fn position(&self) -> f64;
    fn is_playing(&self) -> bool;
    /// バッファリング・ストール中かどうか
    fn is_buffering(&self) -> bool;
    /// 現在位置より先に読み込み済みの秒数
    fn buffered_ahead(&self) -> f64;
    fn rate(&self) -> f64;
    /// 読み込み中のメディア（未読み込みなら空文字列）
    fn source(&self) -> &str;

    fn load(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
    fn set_rate(&mut self, rate: f64);
}

/// 時計に従って仮想タイムラインを進めるプレイヤー
pub struct SimulatedPlayer {
    clock: Arc<dyn Clock>,
    source: String,
    /// 直近の状態変更時点の位置
    anchor_position: f64,
    /// 直近の状態変更時刻（ミリ秒）
    anchor_at_ms: i64,
    playing: bool,
    stalled: bool,
    rate: f64,
    buffered_ahead: f64,
}

impl SimulatedPlayer {
    /// 既定で 30 秒先まで読み込み済みとして扱う
    pub const DEFAULT_BUFFER_AHEAD: f64 = 30.0;

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_millis();
        Self {
            clock,
            source: String::new(),
            anchor_position: 0.0,
            anchor_at_ms: now,
            playing: false,
            stalled: false,
            rate: NORMAL_RATE,
            buffered_ahead: Self::DEFAULT_BUFFER_AHEAD,
        }
    }

    /// ストール状態を切り替える（ストール中は位置が進まない）
    pub fn set_stalled(&mut self, stalled: bool) {
        self.reanchor();
        self.stalled = stalled;
    }

    pub fn set_buffered_ahead(&mut self, seconds: f64) {
        self.buffered_ahead = seconds.max(0.0);
    }

    /// 現在位置を基準点として固定する
    fn reanchor(&mut self) {
        let now = self.clock.now_millis();
        self.anchor_position = self.position_at(now);
        self.anchor_at_ms = now;
    }

    fn position_at(&self, now_ms: i64) -> f64 {
        if !self.playing || self.stalled {
            return self.anchor_position;
        }
        let elapsed = (now_ms - self.anchor_at_ms).max(0) as f64 / 1000.0;
        self.anchor_position + elapsed * self.rate
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn position(&self) -> f64 {
        self.position_at(self.clock.now_millis())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_buffering(&self) -> bool {
        self.stalled
    }

    fn buffered_ahead(&self) -> f64 {
        self.buffered_ahead
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn load(&mut self, url: &str) {
        self.source = url.to_string();
        self.playing = false;
        self.stalled = false;
        self.rate = NORMAL_RATE;
        self.anchor_position = 0.0;
        self.anchor_at_ms = self.clock.now_millis();
    }

    fn play(&mut self) {
        self.reanchor();
        self.playing = true;
    }

    fn pause(&mut self) {
        self.reanchor();
        self.playing = false;
    }

    fn seek(&mut self, position: f64) {
        self.anchor_position = position.max(0.0);
        self.anchor_at_ms = self.clock.now_millis();
    }

    fn set_rate(&mut self, rate: f64) {
        self.reanchor();
        self.rate = rate;
    }
}
