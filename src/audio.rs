//! Synthesised sound: short tones for clicks and explosions, plus a soft ambient
//! pulse while a run is in progress. Audio is best effort; if no output device can
//! be opened the game continues silently.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::Duration;
use thiserror::Error;

pub const SAMPLE_RATE: u32 = 44_100;
const AMBIENT_INTERVAL: Duration = Duration::from_millis(600);
/// Level an exponential decay ramps down to.
const SILENCE: f32 = 0.0001;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output: {0}")]
    Unavailable(String),
    #[error("built without sound support")]
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

impl Waveform {
    /// One sample at `phase` in cycles.
    fn sample(self, phase: f32) -> f32 {
        let p = phase.fract();
        match self {
            Self::Sine => (p * TAU).sin(),
            Self::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Sawtooth => 2.0 * p - 1.0,
        }
    }
}

/// A single enveloped note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub frequency: f32,
    pub gain: f32,
    /// Seconds for the gain to ramp down to silence.
    pub decay: f32,
    /// Total length in seconds.
    pub length: f32,
}

impl Tone {
    pub fn click() -> Self {
        Self {
            waveform: Waveform::Square,
            frequency: 700.0,
            gain: 0.06,
            decay: 0.08,
            length: 0.12,
        }
    }

    pub fn explosion(rng: &mut impl Rng) -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            frequency: 150.0 + rng.gen_range(0.0..400.0),
            gain: 0.16,
            decay: 0.26,
            length: 0.3,
        }
    }

    pub fn ambient(rng: &mut impl Rng) -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: 110.0 + rng.gen_range(0.0..60.0),
            gain: 0.03,
            decay: 0.6,
            length: 0.7,
        }
    }

    fn envelope(&self, t: f32) -> f32 {
        if self.gain <= SILENCE || self.decay <= 0.0 {
            return self.gain.min(SILENCE);
        }
        let t = t.min(self.decay);
        self.gain * (SILENCE / self.gain).powf(t / self.decay)
    }
}

/// Mono samples for `tone` at `rate` Hz.
pub fn render(tone: &Tone, rate: u32) -> Vec<f32> {
    let rate = rate.max(1) as f32;
    let len = (tone.length * rate).round() as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            tone.waveform.sample(tone.frequency * t) * tone.envelope(t)
        })
        .collect()
}

#[cfg(feature = "sound")]
mod backend {
    use super::{AudioError, SAMPLE_RATE};
    use rodio::{OutputStream, OutputStreamHandle, Sink, buffer::SamplesBuffer};

    pub struct Output {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl Output {
        pub fn open() -> Result<Self, AudioError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Unavailable(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }

        pub fn play(&self, samples: Vec<f32>) -> Result<(), AudioError> {
            let sink =
                Sink::try_new(&self.handle).map_err(|e| AudioError::Unavailable(e.to_string()))?;
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
            sink.detach();
            Ok(())
        }
    }
}

#[cfg(not(feature = "sound"))]
mod backend {
    use super::AudioError;

    pub struct Output;

    impl Output {
        pub fn open() -> Result<Self, AudioError> {
            Err(AudioError::Disabled)
        }

        pub fn play(&self, _samples: Vec<f32>) -> Result<(), AudioError> {
            Ok(())
        }
    }
}

pub struct Audio {
    output: Option<backend::Output>,
    muted: bool,
    music: bool,
    since_pulse: Duration,
    rng: StdRng,
    played: u64,
}

impl Audio {
    pub fn new(muted: bool) -> Self {
        let output = match backend::Output::open() {
            Ok(output) => {
                info!("audio output opened");
                Some(output)
            }
            Err(AudioError::Disabled) => {
                debug!("audio: {}", AudioError::Disabled);
                None
            }
            Err(e) => {
                warn!("audio disabled: {}", e);
                None
            }
        };
        Self {
            output,
            muted,
            music: false,
            since_pulse: Duration::ZERO,
            rng: StdRng::from_entropy(),
            played: 0,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Start or stop the ambient pulse.
    pub fn set_music(&mut self, on: bool) {
        if on && !self.music {
            self.since_pulse = AMBIENT_INTERVAL;
        }
        self.music = on;
    }

    /// Tones requested while unmuted, whether or not a device played them.
    #[cfg(test)]
    pub fn played(&self) -> u64 {
        self.played
    }

    pub fn click(&mut self) {
        self.play(Tone::click());
    }

    pub fn explosion(&mut self) {
        let tone = Tone::explosion(&mut self.rng);
        self.play(tone);
    }

    /// Advance the ambient pulse clock. At most one pulse per call, so a stalled
    /// frame loop does not release a burst of tones.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.music {
            return;
        }
        self.since_pulse = (self.since_pulse + elapsed).min(AMBIENT_INTERVAL);
        if self.since_pulse == AMBIENT_INTERVAL {
            self.since_pulse = Duration::ZERO;
            let tone = Tone::ambient(&mut self.rng);
            self.play(tone);
        }
    }

    fn play(&mut self, tone: Tone) {
        if self.muted {
            return;
        }
        self.played += 1;
        debug!("tone #{} ({:?})", self.played, tone.waveform);
        if let Some(output) = &self.output {
            if let Err(e) = output.play(render(&tone, SAMPLE_RATE)) {
                debug!("dropped tone: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent() -> Audio {
        Audio {
            output: None,
            muted: false,
            music: false,
            since_pulse: Duration::ZERO,
            rng: StdRng::seed_from_u64(5),
            played: 0,
        }
    }

    #[test]
    fn test_render_length_and_decay() {
        let tone = Tone::click();
        let samples = render(&tone, 1000);
        assert_eq!(samples.len(), 120);
        assert!(samples.iter().all(|s| s.abs() <= tone.gain + 1e-6));
        let head = samples[..10].iter().map(|s| s.abs()).fold(0.0, f32::max);
        let tail = samples[100..].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(tail < head / 100.0);
    }

    #[test]
    fn test_waveforms() {
        assert_eq!(Waveform::Square.sample(0.25), 1.0);
        assert_eq!(Waveform::Square.sample(0.75), -1.0);
        assert!((Waveform::Sawtooth.sample(0.5)).abs() < 1e-6);
        assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tone_presets_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let e = Tone::explosion(&mut rng);
            assert!((150.0..550.0).contains(&e.frequency));
            let a = Tone::ambient(&mut rng);
            assert!((110.0..170.0).contains(&a.frequency));
        }
    }

    #[test]
    fn test_ambient_pulses_every_interval() {
        let mut audio = silent();
        audio.tick(Duration::from_secs(5));
        assert_eq!(audio.played(), 0);
        audio.set_music(true);
        audio.tick(Duration::ZERO);
        assert_eq!(audio.played(), 1);
        audio.tick(Duration::from_millis(400));
        assert_eq!(audio.played(), 1);
        audio.tick(Duration::from_millis(200));
        assert_eq!(audio.played(), 2);
        audio.tick(Duration::from_millis(600));
        assert_eq!(audio.played(), 3);
        audio.set_music(false);
        audio.tick(Duration::from_secs(5));
        assert_eq!(audio.played(), 3);
    }

    #[test]
    fn test_stalled_clock_releases_one_pulse() {
        let mut audio = silent();
        audio.set_music(true);
        audio.tick(Duration::ZERO);
        assert_eq!(audio.played(), 1);
        audio.tick(Duration::from_secs(30));
        assert_eq!(audio.played(), 2);
        audio.tick(Duration::from_millis(100));
        assert_eq!(audio.played(), 2);
    }

    #[test]
    fn test_mute_silences_everything() {
        let mut audio = silent();
        audio.toggle_mute();
        audio.click();
        audio.explosion();
        assert_eq!(audio.played(), 0);
        assert!(!audio.toggle_mute());
        audio.click();
        assert_eq!(audio.played(), 1);
    }
}
