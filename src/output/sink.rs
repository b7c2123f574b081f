use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type LineSender = mpsc::Sender<String>;
pub type LineReceiver = mpsc::Receiver<String>;

const LINE_BUFFER: usize = 1024;

/// Create the bounded channel that carries fully formatted lines
pub fn create_channel() -> (LineSender, LineReceiver) {
    mpsc::channel(LINE_BUFFER)
}

/// Drain `lines` into `writer`, one line per message.
///
/// This is the only writer of the console, so lines from concurrent tail
/// loops never interleave mid-line. Finishes once every sender is dropped.
pub fn spawn_printer<W>(mut lines: LineReceiver, mut writer: W) -> JoinHandle<std::io::Result<()>>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            writeln!(writer, "{}", line)?;
            // Pick up any backlog before flushing
            while let Ok(line) = lines.try_recv() {
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
        }
        writer.flush()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_printer_writes_lines_until_senders_drop() {
        let buf = SharedBuf::default();
        let (tx, rx) = create_channel();
        let printer = spawn_printer(rx, buf.clone());

        let tx2 = tx.clone();
        tx.send("one".to_string()).await.unwrap();
        tx2.send("two".to_string()).await.unwrap();
        drop(tx);
        drop(tx2);

        printer.await.unwrap().unwrap();
        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "one\ntwo\n");
    }
}
