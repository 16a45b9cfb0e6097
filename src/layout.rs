//! Acquisition-type dispatch table.
//!
//! [`layout_for`] maps a directory record's acquisition-type code to the
//! [`SampleLayout`] its payload is decoded with. The table is sparse and
//! fixed by the M200/M300 instrument manuals; codes it does not know fall
//! back to raw bytes with an unknown-type diagnostic. The table is pure:
//! validation against the record's declared sizes happens in the decoder.

use crate::diagnostics::DiagnosticKind;

// Acquisition types called out by name in the instrument manuals.

/// 2D Mono probe image block: 1024 32-bit slices.
pub const ACQ_TYPE_2D_MONO_IMAGE: u8 = 5;
/// SEA analog-to-digital input, two's complement.
pub const ACQ_TYPE_ANALOG_TO_DIGITAL: u8 = 35;
/// 2D Grey Advanced probe: 128-bit slices.
pub const ACQ_TYPE_2D_GREY_ADVANCED: u8 = 66;
/// CIP image data, stored compressed.
pub const ACQ_TYPE_CIP_IMAGE: u8 = 78;
/// Network binary data, format known only to the receiver.
pub const ACQ_TYPE_NETWORK_BINARY: u8 = 85;
/// Dummy/padding acquisition.
pub const ACQ_TYPE_DUMMY: u8 = 255;

/// A primitive element of a sample layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

impl ElementKind {
    /// Width of the element in bytes.
    pub const fn width(self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::I8 => 1,
            ElementKind::U16 | ElementKind::I16 => 2,
            ElementKind::U32 | ElementKind::I32 => 4,
            ElementKind::U64 | ElementKind::I64 => 8,
        }
    }
}

/// A run of `count` consecutive elements of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRun {
    pub element: ElementKind,
    pub count: usize,
}

impl ElementRun {
    const fn of(element: ElementKind, count: usize) -> Self {
        ElementRun { element, count }
    }
}

/// The ordered element sequence one sample of a payload decodes to.
///
/// For known acquisition types the layout describes one sample and is
/// repeated `samples` times by the decoder. The unknown-type fallback layout
/// instead spans the whole payload once (`per_sample() == false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLayout {
    runs: Vec<ElementRun>,
    per_sample: bool,
}

impl SampleLayout {
    fn known(runs: Vec<ElementRun>) -> Self {
        SampleLayout {
            runs,
            per_sample: true,
        }
    }

    fn whole_payload(runs: Vec<ElementRun>) -> Self {
        SampleLayout {
            runs,
            per_sample: false,
        }
    }

    /// The element runs, in decode order.
    pub fn runs(&self) -> &[ElementRun] {
        &self.runs
    }

    /// Whether the layout describes one sample (repeated per the record's
    /// `samples` field) rather than the whole payload.
    pub fn per_sample(&self) -> bool {
        self.per_sample
    }

    /// Total byte width of one repetition of the layout.
    pub fn byte_len(&self) -> usize {
        self.runs
            .iter()
            .map(|run| run.count * run.element.width())
            .sum()
    }

    /// Whether every element is an unsigned byte, in which case the decoder
    /// keeps the payload as a raw byte vector instead of boxed values.
    pub fn is_raw_bytes(&self) -> bool {
        self.runs.iter().all(|run| run.element == ElementKind::U8)
    }
}

/// Look up the sample layout for an acquisition-type code.
///
/// `bytes_per_sample` sizes the layouts whose element count depends on the
/// sample width (types 66, 85, 255); `number_of_bytes` sizes the raw-byte
/// fallback for unknown codes.
///
/// # Returns
/// The layout, plus an optional diagnostic kind when the lookup was
/// best-effort: [`DiagnosticKind::MisalignedSliceWidth`] when a 2D Grey
/// Advanced width is not a whole number of 128-bit slices, or
/// [`DiagnosticKind::UnknownAcquisitionType`] for codes missing from the
/// table. Both are recoverable; decoding proceeds with the returned layout.
pub fn layout_for(
    typ: u8,
    bytes_per_sample: u16,
    number_of_bytes: u16,
) -> (SampleLayout, Option<DiagnosticKind>) {
    use ElementKind::*;

    let layout = match typ {
        // Type 1 (CAMAC Analog E205/E210): one 16-bit two's complement word.
        1 => SampleLayout::known(vec![ElementRun::of(I16, 1)]),
        // Type 2 (CAMAC 1D Counts): 42 bytes, twenty unsigned 16-bit counts
        // followed by two 8-bit values.
        2 => SampleLayout::known(vec![ElementRun::of(U16, 20), ElementRun::of(I8, 2)]),
        // Type 5 (2D Mono Image): 4096-byte image block of 1024 32-bit slices.
        5 => SampleLayout::known(vec![ElementRun::of(U32, 1024)]),
        // Type 6 (2D Mono TAS Factors): two 16-bit words.
        6 => SampleLayout::known(vec![ElementRun::of(U16, 2)]),
        // Types 7 and 8 (2D Mono Elapsed Time / Elapsed TAS/100): one 32-bit word.
        7 | 8 => SampleLayout::known(vec![ElementRun::of(U32, 1)]),
        // Types 9 and 10 (2D Mono Shadow OR counts): one unsigned 16-bit word.
        9 | 10 => SampleLayout::known(vec![ElementRun::of(U16, 1)]),
        // Type 11 (2D Mono House Data): eight 16-bit words.
        11 => SampleLayout::known(vec![ElementRun::of(U16, 8)]),
        // Type 35 (SEA Analog to Digital Input): one 16-bit two's complement word.
        35 => SampleLayout::known(vec![ElementRun::of(I16, 1)]),
        // Type 66 (2D Grey Advanced): each sample is a set of 128-bit slices,
        // decoded as pairs of 64-bit words. A width that is not a multiple of
        // 16 bytes rounds the slice count up and is diagnosed.
        66 => {
            let slices = usize::from(bytes_per_sample).div_ceil(16);
            let layout = SampleLayout::known(vec![ElementRun::of(U64, 2 * slices)]);
            let note = (bytes_per_sample % 16 != 0)
                .then_some(DiagnosticKind::MisalignedSliceWidth { bytes_per_sample });
            return (layout, note);
        }
        // Type 78 (CIP Image Data): compressed payload, 4096 raw bytes plus a
        // trailing 16-bit word; left opaque for the receiver to decompress.
        78 => SampleLayout::known(vec![ElementRun::of(U8, 4096), ElementRun::of(U16, 1)]),
        // Type 85 (Network Binary Data): caller-opaque bytes.
        85 => SampleLayout::known(vec![ElementRun::of(U8, usize::from(bytes_per_sample))]),
        // Type 255 (Dummy Acquisition).
        255 => SampleLayout::known(vec![ElementRun::of(U8, usize::from(bytes_per_sample))]),
        // Unknown code: read the whole declared payload as bytes once.
        other => {
            let layout =
                SampleLayout::whole_payload(vec![ElementRun::of(U8, usize::from(number_of_bytes))]);
            return (layout, Some(DiagnosticKind::UnknownAcquisitionType { typ: other }));
        }
    };

    (layout, None)
}
