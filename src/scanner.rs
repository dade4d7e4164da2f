use std::io::{BufRead, Read};

use tracing::{debug, trace, warn};

use crate::error::{DeliveryError, Result};
use crate::models::{ScanEvent, SourceKind};

/// Anything that can hand over scanned codes one at a time.
pub trait ScanSource {
    fn kind(&self) -> SourceKind;

    /// Claims the underlying device or listener.
    fn acquire(&mut self) -> Result<()>;

    /// Blocks for the next code. `None` means the input has ended.
    fn next_code(&mut self) -> Result<Option<String>>;

    /// Gives the device back. Must be safe to call more than once.
    fn release(&mut self);
}

/// Holds a source for the length of one scan session and releases it on drop.
pub struct SourceGuard<'a, S: ScanSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: ScanSource + ?Sized> SourceGuard<'a, S> {
    pub fn acquire(source: &'a mut S) -> Result<Self> {
        if let Err(err) = source.acquire() {
            warn!(source = %source.kind(), error = %err, "scan source could not be acquired");
            source.release();
            return Err(err);
        }
        debug!(source = %source.kind(), "scan source acquired");
        Ok(Self { source })
    }

    pub fn next_event(&mut self) -> Result<Option<ScanEvent>> {
        let source = self.source.kind();
        Ok(self.source.next_code()?.map(|code| ScanEvent { source, code }))
    }
}

impl<S: ScanSource + ?Sized> Drop for SourceGuard<'_, S> {
    fn drop(&mut self) {
        self.source.release();
        debug!(source = %self.source.kind(), "scan source released");
    }
}

fn not_acquired(kind: SourceKind) -> DeliveryError {
    DeliveryError::SourceUnavailable {
        kind,
        reason: "source is not acquired".to_string(),
    }
}

/// Codes typed by hand, one per line. Bytes that are not UTF-8 are replaced,
/// so a garbled line reaches the reconciler as an unknown code.
pub struct ManualEntry<R> {
    input: R,
    open: bool,
}

impl<R: BufRead> ManualEntry<R> {
    pub fn new(input: R) -> Self {
        Self { input, open: false }
    }
}

impl<R: BufRead> ScanSource for ManualEntry<R> {
    fn kind(&self) -> SourceKind {
        SourceKind::Manual
    }

    fn acquire(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn next_code(&mut self) -> Result<Option<String>> {
        if !self.open {
            return Err(not_acquired(self.kind()));
        }
        let mut line = Vec::new();
        loop {
            line.clear();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            let code = String::from_utf8_lossy(&line).trim().to_string();
            if !code.is_empty() {
                return Ok(Some(code));
            }
        }
    }

    fn release(&mut self) {
        self.open = false;
    }
}

/// A hardware scanner in keyboard-emulation mode.
///
/// Keystrokes accumulate until the scanner's suffix key (CR, LF or TAB).
/// Groups made only of white characters are dropped, and nothing is
/// forwarded while the listener is not registered.
pub struct KeyboardWedge<R> {
    keys: std::io::Bytes<R>,
    listening: bool,
}

impl<R: Read> KeyboardWedge<R> {
    pub fn new(input: R) -> Self {
        Self {
            keys: input.bytes(),
            listening: false,
        }
    }
}

impl<R: Read> ScanSource for KeyboardWedge<R> {
    fn kind(&self) -> SourceKind {
        SourceKind::KeyboardWedge
    }

    fn acquire(&mut self) -> Result<()> {
        self.listening = true;
        Ok(())
    }

    fn next_code(&mut self) -> Result<Option<String>> {
        if !self.listening {
            return Err(not_acquired(self.kind()));
        }
        let mut buffer = Vec::new();
        loop {
            let key = match self.keys.next() {
                Some(key) => key?,
                None if buffer.is_empty() => return Ok(None),
                None => b'\n',
            };

            if matches!(key, b'\r' | b'\n' | b'\t') {
                let value = String::from_utf8_lossy(&buffer).trim().to_string();
                buffer.clear();
                if value.is_empty() {
                    trace!("white-char keystrokes ignored");
                    continue;
                }
                return Ok(Some(value));
            }
            buffer.push(key);
        }
    }

    fn release(&mut self) {
        self.listening = false;
    }
}

/// One pull from a camera decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Decoded(String),
    /// Nothing readable in this frame; keep scanning.
    Unreadable,
    /// The video feed stopped.
    Ended,
}

/// Camera capture plus barcode decoding, provided by the platform.
pub trait FrameDecoder {
    fn start(&mut self) -> std::result::Result<(), String>;
    fn next_frame(&mut self) -> Frame;
    /// Also called after a failed `start`, so it must tolerate a partial start.
    fn stop(&mut self);
}

pub struct Camera<D> {
    decoder: D,
    running: bool,
}

impl<D: FrameDecoder> Camera<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            running: false,
        }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: FrameDecoder> ScanSource for Camera<D> {
    fn kind(&self) -> SourceKind {
        SourceKind::Camera
    }

    fn acquire(&mut self) -> Result<()> {
        if let Err(reason) = self.decoder.start() {
            // A half-started capture still holds the device.
            self.decoder.stop();
            return Err(DeliveryError::SourceUnavailable {
                kind: SourceKind::Camera,
                reason,
            });
        }
        self.running = true;
        Ok(())
    }

    fn next_code(&mut self) -> Result<Option<String>> {
        if !self.running {
            return Err(not_acquired(self.kind()));
        }
        loop {
            match self.decoder.next_frame() {
                Frame::Decoded(text) => return Ok(Some(text)),
                Frame::Unreadable => continue,
                Frame::Ended => return Ok(None),
            }
        }
    }

    fn release(&mut self) {
        if self.running {
            self.decoder.stop();
            self.running = false;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    #[derive(Default)]
    pub(crate) struct FakeDecoder {
        pub frames: VecDeque<Frame>,
        pub fail_start: Option<String>,
        pub starts: usize,
        pub stops: usize,
    }

    impl FakeDecoder {
        pub fn with_frames(frames: Vec<Frame>) -> Self {
            Self {
                frames: frames.into(),
                ..Self::default()
            }
        }
    }

    impl FrameDecoder for FakeDecoder {
        fn start(&mut self) -> std::result::Result<(), String> {
            self.starts += 1;
            match &self.fail_start {
                Some(reason) => Err(reason.clone()),
                None => Ok(()),
            }
        }

        fn next_frame(&mut self) -> Frame {
            self.frames.pop_front().unwrap_or(Frame::Ended)
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    struct FailingSource {
        releases: usize,
    }

    impl ScanSource for FailingSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Camera
        }

        fn acquire(&mut self) -> Result<()> {
            Err(DeliveryError::SourceUnavailable {
                kind: SourceKind::Camera,
                reason: "busy".into(),
            })
        }

        fn next_code(&mut self) -> Result<Option<String>> {
            Ok(None)
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    #[test]
    fn manual_entry_skips_blank_lines() {
        let mut source = ManualEntry::new(Cursor::new("AWB001\n\n   \n awb-002 \n"));
        let mut guard = SourceGuard::acquire(&mut source).unwrap();

        let first = guard.next_event().unwrap().unwrap();
        assert_eq!(first.code, "AWB001");
        assert_eq!(first.source, SourceKind::Manual);
        assert_eq!(guard.next_event().unwrap().unwrap().code, "awb-002");
        assert!(guard.next_event().unwrap().is_none());
    }

    #[test]
    fn manual_entry_replaces_invalid_utf8() {
        let mut source = ManualEntry::new(Cursor::new(b"\xff\xfe\nAWB001\n".to_vec()));
        let mut guard = SourceGuard::acquire(&mut source).unwrap();

        let garbled = guard.next_event().unwrap().unwrap();
        assert_eq!(garbled.code, "\u{fffd}\u{fffd}");
        assert_eq!(guard.next_event().unwrap().unwrap().code, "AWB001");
    }

    #[test]
    fn manual_entry_requires_acquire() {
        let mut source = ManualEntry::new(Cursor::new("AWB001\n"));
        assert!(source.next_code().is_err());
    }

    #[test]
    fn wedge_splits_on_suffix_keys_and_drops_white_chars() {
        let mut source = KeyboardWedge::new(Cursor::new("AWB001\r\n \tAWB002\tAWB003"));
        let mut guard = SourceGuard::acquire(&mut source).unwrap();

        let codes: Vec<String> = std::iter::from_fn(|| guard.next_event().unwrap())
            .map(|event| event.code)
            .collect();

        assert_eq!(codes, vec!["AWB001", "AWB002", "AWB003"]);
    }

    #[test]
    fn wedge_stops_listening_after_release() {
        let mut source = KeyboardWedge::new(Cursor::new("AWB001\nAWB002\n"));
        {
            let mut guard = SourceGuard::acquire(&mut source).unwrap();
            assert_eq!(guard.next_event().unwrap().unwrap().code, "AWB001");
        }
        assert!(source.next_code().is_err());
    }

    #[test]
    fn camera_skips_unreadable_frames() {
        let decoder = FakeDecoder::with_frames(vec![
            Frame::Unreadable,
            Frame::Unreadable,
            Frame::Decoded("AWB001".into()),
        ]);
        let mut camera = Camera::new(decoder);
        {
            let mut guard = SourceGuard::acquire(&mut camera).unwrap();
            let event = guard.next_event().unwrap().unwrap();
            assert_eq!(event.code, "AWB001");
            assert_eq!(event.source, SourceKind::Camera);
            assert!(guard.next_event().unwrap().is_none());
        }
        assert_eq!(camera.decoder().starts, 1);
        assert_eq!(camera.decoder().stops, 1);
    }

    #[test]
    fn camera_unavailable_is_reported() {
        let decoder = FakeDecoder {
            fail_start: Some("permission denied".into()),
            ..FakeDecoder::default()
        };
        let mut camera = Camera::new(decoder);

        let err = SourceGuard::acquire(&mut camera).err().unwrap();

        assert!(matches!(
            err,
            DeliveryError::SourceUnavailable {
                kind: SourceKind::Camera,
                ..
            }
        ));
        assert_eq!(camera.decoder().stops, 1);
        assert!(camera.next_code().is_err());
    }

    #[test]
    fn failed_acquire_still_releases() {
        let mut source = FailingSource { releases: 0 };
        assert!(SourceGuard::acquire(&mut source).is_err());
        assert_eq!(source.releases, 1);
    }
}
