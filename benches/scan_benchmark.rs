//! Benchmarks for scanning and decoding synthetic dump streams.
//!
//! Run with: cargo bench --bench scan_benchmark

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use m200_rs::records::{DIRECTORY_RECORD_SIZE, LAST_TAG, NEXT_TAG, TIME_RECORD_ADDRESS, TIME_TAG};
use m200_rs::{BufferScanner, DirectoryRecord, RecordFilter, SeaFile, SeaTime};

fn blank_record(tag_number: u16) -> DirectoryRecord {
    DirectoryRecord {
        tag_number,
        data_offset: 0,
        number_of_bytes: 0,
        samples: 0,
        bytes_per_sample: 0,
        typ: 0,
        parameter1: 0,
        parameter2: 0,
        parameter3: 0,
        address: 0,
    }
}

fn encode_buffer(mut entries: Vec<(DirectoryRecord, Vec<u8>)>, terminal_tag: u16) -> Vec<u8> {
    let dir_len = (entries.len() + 1) * DIRECTORY_RECORD_SIZE;
    let mut cursor = dir_len;
    for (record, payload) in &mut entries {
        record.data_offset = cursor as u16;
        cursor += payload.len();
    }

    let mut terminal = blank_record(terminal_tag);
    if terminal_tag == NEXT_TAG {
        terminal.data_offset = cursor as u16;
    }

    let mut out = Vec::with_capacity(cursor);
    for (record, _) in &entries {
        out.extend_from_slice(&record.to_bytes());
    }
    out.extend_from_slice(&terminal.to_bytes());
    for (_, payload) in &entries {
        out.extend_from_slice(payload);
    }
    out
}

/// A synthetic stream of `num_buffers` buffers, each with a time record and
/// `num_tags` analog data records.
fn synthetic_file(num_buffers: usize, num_tags: u16) -> Vec<u8> {
    let time = SeaTime {
        year: 2019,
        month: 3,
        day: 1,
        hour: 10,
        minute: 0,
        second: 0,
        fraction_of_second: 0,
        max_sys_freq: 10000,
        buffer_life_span: 0,
    };

    let mut file = Vec::new();
    for i in 0..num_buffers {
        let mut time_record = blank_record(TIME_TAG);
        time_record.number_of_bytes = 36;
        time_record.samples = 2;
        time_record.bytes_per_sample = 18;
        time_record.address = TIME_RECORD_ADDRESS;
        let mut time_payload = time.to_bytes().to_vec();
        time_payload.extend_from_slice(&time.to_bytes());

        let mut entries = vec![(time_record, time_payload)];
        for tag in 0..num_tags {
            let mut record = blank_record(300 + tag);
            record.typ = 35;
            record.samples = 1;
            record.bytes_per_sample = 2;
            record.number_of_bytes = 2;
            entries.push((record, (tag as i16).to_le_bytes().to_vec()));
        }

        let terminal = if i + 1 == num_buffers { LAST_TAG } else { NEXT_TAG };
        file.extend(encode_buffer(entries, terminal));
    }
    file
}

fn bench_scan(c: &mut Criterion) {
    let file = synthetic_file(1000, 32);

    c.bench_function("scan_1000_buffers", |b| {
        b.iter(|| {
            let scanner = BufferScanner::new(black_box(file.clone()), RecordFilter::new());
            let count = scanner.filter_map(|raw| raw.ok()).count();
            assert_eq!(count, 1000);
        })
    });

    c.bench_function("scan_filtered_1000_buffers", |b| {
        let filter = RecordFilter::new().allow_tag_numbers([305]);
        b.iter(|| {
            let scanner = BufferScanner::new(black_box(file.clone()), filter.clone());
            scanner.filter_map(|raw| raw.ok()).count()
        })
    });
}

fn bench_decode(c: &mut Criterion) {
    let file = synthetic_file(1000, 32);

    c.bench_function("decode_1000_buffers", |b| {
        b.iter(|| {
            let sea = SeaFile::from_bytes(black_box(file.clone())).unwrap();
            let mut datasets = 0usize;
            for buffer in sea.buffers() {
                datasets += buffer.unwrap().len();
            }
            assert_eq!(datasets, 1000 * 33);
        })
    });
}

criterion_group!(benches, bench_scan, bench_decode);
criterion_main!(benches);
