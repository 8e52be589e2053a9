use check_dmesg::{collect_to_buffer, LogRecord, LogSource, Result};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use futures_util::stream::{self, BoxStream};

/// In-memory kernel log with a fixed number of lines
struct RepeatSource {
    count: usize,
}

impl LogSource for RepeatSource {
    async fn lines(&mut self) -> Result<BoxStream<'static, Result<String>>> {
        let lines: Vec<Result<String>> = (0..self.count)
            .map(|i| {
                Ok(format!(
                    "kern  :err   : [Mon Oct 19 17:38:{:02} 2026] nvme0n1: I/O error, sector {}   ",
                    i % 60,
                    i
                ))
            })
            .collect();
        Ok(Box::pin(stream::iter(lines)))
    }
}

/// Benchmark formatting a single buffer record
fn bench_record_formatting(c: &mut Criterion) {
    let line = "[    1.234567] EXT4-fs error (device sda1): ext4_find_entry:1455: inode #2   \n";

    c.bench_function("record_formatting", |b| {
        b.iter(|| LogRecord::from_line("host1", line).to_string())
    });
}

/// Benchmark writing buffers of increasing size
fn bench_collect_to_buffer(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = dir.path().join("check_dmesg.tmp");

    let mut group = c.benchmark_group("collect_to_buffer");
    for count in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.to_async(&rt).iter(|| {
                let path = path.clone();
                async move {
                    let mut source = RepeatSource { count };
                    collect_to_buffer(&mut source, "host1", &path)
                        .await
                        .expect("Should collect")
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_record_formatting, bench_collect_to_buffer);
criterion_main!(benches);
