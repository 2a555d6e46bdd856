use rs2_pull::error::ErrorHolder;
use rs2_pull::*;
use std::io::{self, BufRead, BufReader, Read};

/// Reader that yields one line and then fails.
struct FlakyReader {
    served: bool,
}

impl Read for FlakyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        }
        self.served = true;
        let line = b"ok\n";
        buf[..line.len()].copy_from_slice(line);
        Ok(line.len())
    }
}

#[test]
fn test_lines_surface_io_errors() {
    let reader = BufReader::new(FlakyReader { served: false });
    let mut iter = PullStream::lines(reader).into_iter();

    assert_eq!(iter.next(), Some(Ok("ok".to_string())));
    match iter.next() {
        Some(Err(StreamError::IO(message))) => assert!(message.contains("disk on fire")),
        other => panic!("expected an IO error, got {:?}", other),
    }
    assert_eq!(iter.next(), None);
}

#[test]
fn test_lines_accept_any_bufread() {
    let reader: Box<dyn BufRead + Send> = Box::new(io::Cursor::new(b"a\nb".to_vec()));
    assert_eq!(PullStream::lines(reader).count().unwrap(), 2);
}

#[test]
fn test_try_map_error_stops_pipeline() {
    let mut seen = Vec::new();
    let result = PullStream::of(vec![1, 2, 3, 4])
        .try_map(|x| {
            if x == 3 {
                Err(StreamError::Custom(format!("bad value {}", x)))
            } else {
                Ok(x)
            }
        })
        .for_each(|x| seen.push(x));

    assert_eq!(result, Err(StreamError::Custom("bad value 3".into())));
    assert_eq!(seen, vec![1, 2]);
}

#[test]
fn test_with_suppressed_flattens() {
    let inner = StreamError::Timeout.with_suppressed(StreamError::Cancelled);
    let outer = StreamError::Custom("first".into()).with_suppressed(inner);

    assert_eq!(outer.primary(), &StreamError::Custom("first".into()));
    assert_eq!(outer.suppressed(), &[StreamError::Timeout, StreamError::Cancelled]);

    let plain = StreamError::NoSuchElement;
    assert_eq!(plain.primary(), &StreamError::NoSuchElement);
    assert!(plain.suppressed().is_empty());
}

#[test]
fn test_error_holder_keeps_first_error() {
    let holder = ErrorHolder::new();
    assert!(!holder.is_set());
    assert_eq!(holder.get(), None);

    holder.record(StreamError::Timeout);
    holder.record(StreamError::Custom("later".into()));

    let err = holder.get().unwrap();
    assert!(holder.is_set());
    assert_eq!(err.primary(), &StreamError::Timeout);
    assert_eq!(err.suppressed(), &[StreamError::Custom("later".into())]);
}

#[test]
fn test_error_display() {
    assert_eq!(StreamError::Timeout.to_string(), "Operation timed out");
    assert_eq!(
        StreamError::InvalidArgument("k must be at least 1".into()).to_string(),
        "Invalid argument: k must be at least 1"
    );
    assert_eq!(StreamError::TaskPanicked("boom".into()).to_string(), "Task panicked: boom");
    assert_eq!(
        StreamError::Custom("x".into())
            .with_suppressed(StreamError::Timeout)
            .with_suppressed(StreamError::Cancelled)
            .to_string(),
        "Stream error: x (with 2 suppressed)"
    );
}

#[test]
fn test_io_error_conversion() {
    let err: StreamError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
    assert_eq!(err, StreamError::IO("missing".into()));
}

#[test]
fn test_next_on_exhausted_iterator() {
    use rs2_pull::stream::{LazyIterator, VecSource};

    let mut source = VecSource::new(vec![1]);
    assert_eq!(source.next(), Ok(1));
    assert_eq!(source.next(), Err(StreamError::NoSuchElement));
}

#[test]
fn test_usage_errors_are_reported() {
    assert!(matches!(PullStream::of(vec![1]).split(0), Err(StreamError::InvalidArgument(_))));
    assert!(matches!(
        PullStream::of(vec![1]).kth_largest(0),
        Err(StreamError::InvalidArgument(_))
    ));
    assert!(matches!(
        PullStream::of_range(vec![1, 2], 1, 3),
        Err(StreamError::InvalidArgument(_))
    ));
}
