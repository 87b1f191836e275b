//! Safetensors encoding of a list of blocks.
//!
//! Each analog signal becomes an `F32` tensor `[C, T]` and each spike train an
//! `F64` tensor `[n]`, named by position:
//!
//! ```text
//! block0/segment1/analog_signal2   F32 [C, T]
//! block0/segment1/spike_train0     F64 [n]
//! ```
//!
//! The block structure and all non-sample fields (names, rates, units,
//! annotations) are stored as a JSON string under
//! `__metadata__["ephys.layout"]`, so the file stays readable by any
//! safetensors consumer.
use std::collections::HashMap;
use std::io::Write;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::model::{AnalogSignal, Annotations, Block, Segment, SpikeTrain};

const LAYOUT_KEY: &str = "ephys.layout";
const METADATA_KEY: &str = "__metadata__";

// ── Layout (stored in the header metadata) ────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct BlockLayout {
    name: Option<String>,
    #[serde(default)]
    annotations: Annotations,
    segments: Vec<SegmentLayout>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SegmentLayout {
    name: Option<String>,
    analog_signals: Vec<SignalLayout>,
    spike_trains: Vec<SpikeTrainLayout>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SignalLayout {
    tensor: String,
    name: String,
    sampling_rate: f64,
    t_start: f64,
    units: String,
    #[serde(default)]
    annotations: Annotations,
}

#[derive(Debug, Serialize, Deserialize)]
struct SpikeTrainLayout {
    tensor: String,
    name: String,
    t_start: f64,
    t_stop: f64,
    units: String,
    #[serde(default)]
    annotations: Annotations,
}

// ── Writer ────────────────────────────────────────────────────────────────

/// Minimal safetensors writer for `F32` / `F64` tensors plus string metadata.
struct TensorWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl TensorWriter {
    fn new() -> Self {
        Self { entries: Vec::new(), metadata: serde_json::Map::new() }
    }

    fn add_f32_arr2(&mut self, name: &str, arr: &Array2<f32>) {
        let bytes: Vec<u8> = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", vec![arr.nrows(), arr.ncols()]));
    }

    fn add_f64(&mut self, name: &str, data: &[f64]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", vec![data.len()]));
    }

    fn set_metadata(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), serde_json::Value::String(value));
    }

    fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut header = serde_json::Map::new();
        if !self.metadata.is_empty() {
            header.insert(METADATA_KEY.to_string(), serde_json::Value::Object(self.metadata.clone()));
        }
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let mut hdr_bytes = serde_json::to_vec(&header)?;
        // Header length is padded to a multiple of 8 with spaces.
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        hdr_bytes.extend(std::iter::repeat(b' ').take(pad));

        out.write_all(&(hdr_bytes.len() as u64).to_le_bytes())?;
        out.write_all(&hdr_bytes)?;
        for (_, data, _, _) in &self.entries {
            out.write_all(data)?;
        }
        Ok(())
    }
}

/// Serialize `blocks` into `out`.
pub fn write_blocks<W: Write>(blocks: &[Block], out: &mut W) -> Result<()> {
    let mut w = TensorWriter::new();
    let mut layouts = Vec::with_capacity(blocks.len());

    for (b, block) in blocks.iter().enumerate() {
        let mut segments = Vec::with_capacity(block.segments.len());
        for (s, segment) in block.segments.iter().enumerate() {
            let mut analog_signals = Vec::with_capacity(segment.analog_signals.len());
            for (k, sig) in segment.analog_signals.iter().enumerate() {
                let tensor = format!("block{b}/segment{s}/analog_signal{k}");
                w.add_f32_arr2(&tensor, &sig.data);
                analog_signals.push(SignalLayout {
                    tensor,
                    name: sig.name.clone(),
                    sampling_rate: sig.sampling_rate,
                    t_start: sig.t_start,
                    units: sig.units.clone(),
                    annotations: sig.annotations.clone(),
                });
            }
            let mut spike_trains = Vec::with_capacity(segment.spike_trains.len());
            for (k, st) in segment.spike_trains.iter().enumerate() {
                let tensor = format!("block{b}/segment{s}/spike_train{k}");
                w.add_f64(&tensor, &st.times);
                spike_trains.push(SpikeTrainLayout {
                    tensor,
                    name: st.name.clone(),
                    t_start: st.t_start,
                    t_stop: st.t_stop,
                    units: st.units.clone(),
                    annotations: st.annotations.clone(),
                });
            }
            segments.push(SegmentLayout { name: segment.name.clone(), analog_signals, spike_trains });
        }
        layouts.push(BlockLayout {
            name: block.name.clone(),
            annotations: block.annotations.clone(),
            segments,
        });
    }

    w.set_metadata(LAYOUT_KEY, serde_json::to_string(&layouts)?);
    w.write_to(out)
}

// ── Reader ────────────────────────────────────────────────────────────────

type Header = HashMap<String, serde_json::Value>;

fn parse_header(bytes: &[u8]) -> Result<(Header, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small ({} bytes)", bytes.len());
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len_bytes) as usize;
    let end = 8usize.checked_add(n).filter(|&e| e <= bytes.len())
        .with_context(|| format!("safetensors header length {n} exceeds file size"))?;
    let header: Header = serde_json::from_slice(&bytes[8..end])
        .context("failed to parse safetensors header")?;
    Ok((header, end))
}

/// Whether `bytes` start with a plausible safetensors header.
pub fn sniff(bytes: &[u8]) -> bool {
    if bytes.len() < 9 {
        return false;
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len_bytes);
    n >= 2 && (n as u128) + 8 <= bytes.len() as u128 && bytes[8] == b'{'
}

struct TensorRef<'a> {
    dtype: &'a str,
    shape: Vec<usize>,
    raw: &'a [u8],
}

fn tensor<'a>(header: &'a Header, bytes: &'a [u8], data_start: usize, name: &str) -> Result<TensorRef<'a>> {
    let entry = header.get(name).with_context(|| format!("missing tensor '{name}'"))?;
    let dtype = entry["dtype"].as_str().with_context(|| format!("tensor '{name}': missing dtype"))?;
    let shape = entry["shape"]
        .as_array()
        .with_context(|| format!("tensor '{name}': missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<Vec<_>>>()
        .with_context(|| format!("tensor '{name}': malformed shape"))?;
    let offsets = entry["data_offsets"]
        .as_array()
        .filter(|o| o.len() == 2)
        .with_context(|| format!("tensor '{name}': missing data_offsets"))?;
    let (s, e) = match (offsets[0].as_u64(), offsets[1].as_u64()) {
        (Some(s), Some(e)) if s <= e => (s as usize, e as usize),
        _ => bail!("tensor '{name}': malformed data_offsets"),
    };
    let raw = bytes
        .get(data_start + s..data_start + e)
        .with_context(|| format!("tensor '{name}': data out of bounds"))?;
    Ok(TensorRef { dtype, shape, raw })
}

fn read_signal(header: &Header, bytes: &[u8], data_start: usize, l: SignalLayout) -> Result<AnalogSignal> {
    let t = tensor(header, bytes, data_start, &l.tensor)?;
    if t.dtype != "F32" || t.shape.len() != 2 {
        bail!("tensor '{}': expected F32 [C, T], got {} {:?}", l.tensor, t.dtype, t.shape);
    }
    let values: Vec<f32> = t.raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let data = Array2::from_shape_vec((t.shape[0], t.shape[1]), values)
        .with_context(|| format!("tensor '{}': size does not match shape", l.tensor))?;
    let sig = AnalogSignal::new(l.name, data, l.sampling_rate)?.with_t_start(l.t_start).with_units(l.units);
    Ok(AnalogSignal { annotations: l.annotations, ..sig })
}

fn read_spike_train(header: &Header, bytes: &[u8], data_start: usize, l: SpikeTrainLayout) -> Result<SpikeTrain> {
    let t = tensor(header, bytes, data_start, &l.tensor)?;
    if t.dtype != "F64" || t.shape.len() != 1 {
        bail!("tensor '{}': expected F64 [n], got {} {:?}", l.tensor, t.dtype, t.shape);
    }
    let times: Vec<f64> = t.raw
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();
    let st = SpikeTrain::new(l.name, times, l.t_start, l.t_stop)?;
    Ok(SpikeTrain { units: l.units, annotations: l.annotations, ..st })
}

/// Parse blocks from the bytes of a safetensors file written by [`write_blocks`].
pub fn read_blocks(bytes: &[u8]) -> Result<Vec<Block>> {
    let (header, data_start) = parse_header(bytes)?;
    let layout_json = header
        .get(METADATA_KEY)
        .and_then(|m| m.get(LAYOUT_KEY))
        .and_then(|v| v.as_str())
        .with_context(|| format!("missing '{LAYOUT_KEY}' metadata; not an ephys safetensors file"))?;
    let layouts: Vec<BlockLayout> = serde_json::from_str(layout_json)
        .context("failed to parse block layout metadata")?;

    let mut blocks = Vec::with_capacity(layouts.len());
    for bl in layouts {
        let mut segments = Vec::with_capacity(bl.segments.len());
        for sl in bl.segments {
            let analog_signals = sl.analog_signals
                .into_iter()
                .map(|l| read_signal(&header, bytes, data_start, l))
                .collect::<Result<Vec<_>>>()?;
            let spike_trains = sl.spike_trains
                .into_iter()
                .map(|l| read_spike_train(&header, bytes, data_start, l))
                .collect::<Result<Vec<_>>>()?;
            segments.push(Segment { name: sl.name, analog_signals, spike_trains });
        }
        blocks.push(Block { name: bl.name, annotations: bl.annotations, segments });
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_padded_to_eight() {
        let mut buf = Vec::new();
        write_blocks(&[Block::named("x")], &mut buf).unwrap();
        let n = u64::from_le_bytes(buf[..8].try_into().unwrap()) as usize;
        assert_eq!(n % 8, 0);
        assert!(sniff(&buf));
    }

    #[test]
    fn tensor_shapes_in_header() {
        let sig = AnalogSignal::new("a", Array2::from_elem((3, 5), 1.5_f32), 250.0).unwrap();
        let block = Block::from_series(vec![sig], vec![]).unwrap();
        let mut buf = Vec::new();
        write_blocks(&[block], &mut buf).unwrap();
        let (header, _) = parse_header(&buf).unwrap();
        let entry = &header["block0/segment0/analog_signal0"];
        assert_eq!(entry["dtype"], "F32");
        assert_eq!(entry["shape"], serde_json::json!([3, 5]));
    }

    #[test]
    fn rejects_truncated_file() {
        let mut buf = Vec::new();
        write_blocks(&[Block::named("x")], &mut buf).unwrap();
        assert!(read_blocks(&buf[..buf.len() / 2]).is_err());
        assert!(read_blocks(&[1, 2, 3]).is_err());
    }

    #[test]
    fn sniff_rejects_json_text() {
        assert!(!sniff(br#"{"format": "ephys", "blocks": []}"#));
    }
}
