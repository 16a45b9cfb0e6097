use m200_rs::records::{DIRECTORY_RECORD_SIZE, LAST_TAG, NEXT_TAG, TIME_RECORD_ADDRESS, TIME_TAG};
use m200_rs::{
    BufferDecoder, BufferScanner, DataSet, DiagnosticKind, DirectoryRecord, Error, RecordFilter,
    Result, SeaTime, Value, read_dataset, read_string_dataset,
};

fn sample_time() -> SeaTime {
    SeaTime {
        year: 2019,
        month: 3,
        day: 1,
        hour: 10,
        minute: 0,
        second: 0,
        fraction_of_second: 2500,
        max_sys_freq: 10000,
        buffer_life_span: 50,
    }
}

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

fn time_entry(time: SeaTime) -> (DirectoryRecord, Vec<u8>) {
    let mut record = blank_record(TIME_TAG);
    record.number_of_bytes = 36;
    record.samples = 2;
    record.bytes_per_sample = 18;
    record.address = TIME_RECORD_ADDRESS;
    let mut payload = time.to_bytes().to_vec();
    payload.extend_from_slice(&time.to_bytes());
    (record, payload)
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

fn two_buffer_file() -> Vec<u8> {
    let mut file = encode_buffer(vec![time_entry(sample_time())], NEXT_TAG);
    file.extend(encode_buffer(vec![time_entry(sample_time())], LAST_TAG));
    file
}

#[test]
fn scanner_partitions_the_stream() -> Result<()> {
    let file = two_buffer_file();
    let first_len = 2 * DIRECTORY_RECORD_SIZE + 36;

    let mut scanner = BufferScanner::new(file.clone(), RecordFilter::new());
    let raw = (&mut scanner).collect::<Result<Vec<_>>>()?;

    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].range, 0..first_len);
    assert_eq!(raw[1].range, first_len..file.len());
    // Terminal records are part of the directory run.
    assert_eq!(raw[0].records.len(), 2);
    assert_eq!(raw[0].records[1].tag_number, NEXT_TAG);
    assert_eq!(raw[1].records[1].tag_number, LAST_TAG);

    assert!(scanner.is_finished());
    assert!(scanner.seen_last());
    assert!(!scanner.missing_last());
    Ok(())
}

#[test]
fn scanner_resynchronizes_over_leading_garbage() -> Result<()> {
    let mut file = vec![0xFFu8; 7];
    file.extend(two_buffer_file());

    let scanner = BufferScanner::new(file, RecordFilter::new());
    let raw = scanner.collect::<Result<Vec<_>>>()?;

    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].range.start, 7);
    assert!(
        raw[0]
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ResyncSkipped { bytes: 7 })
    );
    Ok(())
}

#[test]
fn next_record_shorter_than_directory_is_fatal() {
    let (time_record, payload) = time_entry(sample_time());
    let mut next = blank_record(NEXT_TAG);
    // Claims a 16-byte buffer that cannot hold its own two-record directory.
    next.data_offset = 16;

    let mut file = time_record.to_bytes().to_vec();
    file.extend_from_slice(&next.to_bytes());
    file.extend_from_slice(&payload);

    let mut scanner = BufferScanner::new(file, RecordFilter::new());
    match scanner.next() {
        Some(Err(Error::InvalidFileFormat { .. })) => {}
        other => panic!("unexpected {other:?}"),
    }
    assert!(scanner.next().is_none());
    assert!(scanner.is_finished());
}

#[test]
fn payload_boundary_is_exact() {
    let mut record = blank_record(7);
    record.typ = 1;
    record.samples = 1;
    record.bytes_per_sample = 2;
    record.number_of_bytes = 2;

    // Exact fit: the payload ends on the last byte of the buffer.
    record.data_offset = 30;
    let raw = vec![0u8; 32];
    assert!(read_dataset(&record, &raw, 0).is_ok());

    // One byte past the end.
    record.data_offset = 31;
    match read_dataset(&record, &raw, 0) {
        Err(Error::PayloadOverrun {
            expected_end,
            buffer_len,
            ..
        }) => {
            assert_eq!(expected_end, 33);
            assert_eq!(buffer_len, 32);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn sample_size_mismatch_is_diagnosed_not_fatal() -> Result<()> {
    let mut record = blank_record(7);
    record.typ = 1;
    record.samples = 2;
    record.bytes_per_sample = 2;
    // Declared size covers only one of the two samples.
    record.number_of_bytes = 2;
    record.data_offset = 0;

    let raw = [1u8, 0, 2, 0];
    let (dataset, diagnostics) = read_dataset(&record, &raw, 0)?;

    assert_eq!(dataset, DataSet::Samples(vec![Value::I16(1), Value::I16(2)]));
    assert!(diagnostics.iter().any(|d| {
        d.kind
            == DiagnosticKind::SampleSizeMismatch {
                number_of_bytes: 2,
                expected: 4,
            }
    }));
    Ok(())
}

#[test]
fn camac_counts_decode_as_words_then_bytes() -> Result<()> {
    let mut record = blank_record(300);
    record.typ = 2;
    record.samples = 1;
    record.bytes_per_sample = 42;
    record.number_of_bytes = 42;
    record.data_offset = 0;

    let mut raw = Vec::new();
    for count in 0u16..20 {
        raw.extend_from_slice(&(count * 10).to_le_bytes());
    }
    raw.push((-1i8) as u8);
    raw.push(4);

    let (dataset, diagnostics) = read_dataset(&record, &raw, 0)?;
    let values = dataset.as_samples().unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(values.len(), 22);
    assert_eq!(values[0], Value::U16(0));
    assert_eq!(values[19], Value::U16(190));
    assert_eq!(values[20], Value::I8(-1));
    assert_eq!(values[21], Value::I8(4));
    Ok(())
}

#[test]
fn grey_advanced_misaligned_width_rounds_up() -> Result<()> {
    let mut record = blank_record(301);
    record.typ = 66;
    record.samples = 1;
    // One and a half 128-bit slices; decodes as two.
    record.bytes_per_sample = 24;
    record.number_of_bytes = 32;
    record.data_offset = 0;

    let raw: Vec<u8> = (0u8..32).collect();
    let (dataset, diagnostics) = read_dataset(&record, &raw, 0)?;
    let values = dataset.as_samples().unwrap();

    assert_eq!(values.len(), 4);
    assert_eq!(values[0], Value::U64(u64::from_le_bytes([0, 1, 2, 3, 4, 5, 6, 7])));
    assert!(diagnostics.iter().any(|d| {
        d.kind == DiagnosticKind::MisalignedSliceWidth {
            bytes_per_sample: 24,
        }
    }));
    Ok(())
}

#[test]
fn network_binary_stays_raw() -> Result<()> {
    let mut record = blank_record(302);
    record.typ = 85;
    record.samples = 2;
    record.bytes_per_sample = 3;
    record.number_of_bytes = 6;
    record.data_offset = 0;

    let raw = [9u8, 8, 7, 6, 5, 4];
    let (dataset, diagnostics) = read_dataset(&record, &raw, 0)?;

    assert!(diagnostics.is_empty());
    assert_eq!(dataset, DataSet::Raw(raw.to_vec()));
    Ok(())
}

#[test]
fn string_records_split_into_fixed_width_samples() -> Result<()> {
    let mut record = blank_record(65530);
    record.samples = 2;
    record.bytes_per_sample = 4;
    record.number_of_bytes = 8;
    record.data_offset = 0;

    match read_string_dataset(&record, b"abcdefgh")? {
        DataSet::Strings(strings) => {
            assert_eq!(strings, vec![b"abcd".to_vec(), b"efgh".to_vec()]);
        }
        other => panic!("unexpected {other:?}"),
    }

    // Declared span past the end of the buffer.
    assert!(read_string_dataset(&record, b"abcdef").is_err());
    Ok(())
}

#[test]
fn invalid_timestamp_is_a_per_record_fault() -> Result<()> {
    let mut bad_time = sample_time();
    bad_time.month = 13;
    let mut file = encode_buffer(vec![time_entry(bad_time)], NEXT_TAG);
    file.extend(encode_buffer(vec![time_entry(sample_time())], LAST_TAG));

    let scanner = BufferScanner::new(file.clone(), RecordFilter::new());
    let decoder = BufferDecoder::new();
    let buffers: Vec<_> = scanner
        .map(|raw| raw.map(|raw| decoder.decode(&raw, &file)))
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(buffers.len(), 2);
    assert!(buffers[0].datetime().is_none());
    assert!(buffers[0].diagnostics().iter().any(|d| {
        matches!(&d.kind, DiagnosticKind::InvalidTimestamp { time } if time.month == 13)
    }));
    assert!(buffers[1].datetime().is_some());
    Ok(())
}

#[test]
fn filtered_scan_drops_buffers_before_decode() -> Result<()> {
    let mut data = blank_record(7);
    data.typ = 1;
    data.samples = 1;
    data.bytes_per_sample = 2;
    data.number_of_bytes = 2;

    let mut file = encode_buffer(
        vec![time_entry(sample_time()), (data, vec![5, 0])],
        NEXT_TAG,
    );
    file.extend(encode_buffer(vec![time_entry(sample_time())], NEXT_TAG));
    file.extend(encode_buffer(vec![time_entry(sample_time())], LAST_TAG));

    let filter = RecordFilter::new().allow_tag_numbers([7]);
    let raw = BufferScanner::new(file, filter).collect::<Result<Vec<_>>>()?;

    assert_eq!(raw.len(), 1);
    assert!(raw[0].records.iter().any(|r| r.tag_number == 7));
    Ok(())
}
