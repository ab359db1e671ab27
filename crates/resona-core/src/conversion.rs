use crate::error::SystemError;
use resona_ports::sampled::{AudioFormat, AudioInputStream, Encoding, FormatConversionProvider};
use std::collections::VecDeque;
use std::sync::Arc;

const TARGET: &str = "resona::conversion";

/// Longest converter chain `convert_chained` will build.
pub const MAX_CONVERSION_HOPS: usize = 3;

/// Encodings reachable from `source` in one hop, first-seen order.
pub fn target_encodings(
    converters: &[Arc<dyn FormatConversionProvider>],
    source: &AudioFormat,
) -> Vec<Encoding> {
    let mut encodings: Vec<Encoding> = Vec::new();
    for converter in converters {
        for encoding in converter.target_encodings_for(source) {
            if !encodings.contains(&encoding) {
                encodings.push(encoding);
            }
        }
    }
    encodings
}

pub fn target_formats(
    converters: &[Arc<dyn FormatConversionProvider>],
    encoding: &Encoding,
    source: &AudioFormat,
) -> Vec<AudioFormat> {
    converters
        .iter()
        .flat_map(|converter| converter.target_formats(encoding, source))
        .collect()
}

pub fn is_conversion_supported(
    converters: &[Arc<dyn FormatConversionProvider>],
    target: &AudioFormat,
    source: &AudioFormat,
) -> bool {
    source.matches(target)
        || converters
            .iter()
            .any(|converter| converter.is_conversion_supported(target, source))
}

/// Converts `stream` to `target` with a single converter. A stream already
/// in the target format is returned untouched.
pub fn convert(
    converters: &[Arc<dyn FormatConversionProvider>],
    target: &AudioFormat,
    stream: AudioInputStream,
) -> Result<AudioInputStream, SystemError> {
    if stream.format().matches(target) {
        return Ok(stream);
    }

    let source = stream.format().clone();
    match converters
        .iter()
        .find(|converter| converter.is_conversion_supported(target, &source))
    {
        Some(converter) => {
            log::debug!(target: TARGET, "{} converts {source} to {target}", converter.type_name());
            Ok(converter.convert(target, stream)?)
        }
        None => Err(unsupported(&source, target)),
    }
}

/// One hop of a conversion chain: which converter, and the format it is
/// asked to produce.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionStep {
    pub converter: usize,
    pub format: AudioFormat,
}

/// Shortest chain of at most `max_hops` converters from `source` to
/// `target`. Ties go to the earlier converter.
pub fn find_conversion_path(
    converters: &[Arc<dyn FormatConversionProvider>],
    source: &AudioFormat,
    target: &AudioFormat,
    max_hops: usize,
) -> Option<Vec<ConversionStep>> {
    if source.matches(target) {
        return Some(Vec::new());
    }

    let mut visited = vec![source.clone()];
    let mut queue: VecDeque<(AudioFormat, Vec<ConversionStep>)> = VecDeque::new();
    queue.push_back((source.clone(), Vec::new()));

    while let Some((format, path)) = queue.pop_front() {
        if path.len() >= max_hops {
            continue;
        }

        for (index, converter) in converters.iter().enumerate() {
            if converter.is_conversion_supported(target, &format) {
                let mut path = path;
                path.push(ConversionStep {
                    converter: index,
                    format: target.resolved_against(&format),
                });
                return Some(path);
            }
        }

        if path.len() + 1 >= max_hops {
            continue;
        }
        for (index, converter) in converters.iter().enumerate() {
            for encoding in converter.target_encodings_for(&format) {
                for candidate in converter.target_formats(&encoding, &format) {
                    let next = candidate.resolved_against(&format);
                    if visited.contains(&next) {
                        continue;
                    }
                    visited.push(next.clone());
                    let mut next_path = path.clone();
                    next_path.push(ConversionStep {
                        converter: index,
                        format: next.clone(),
                    });
                    queue.push_back((next, next_path));
                }
            }
        }
    }

    None
}

/// Like [`convert`], but may route through intermediate formats.
pub fn convert_chained(
    converters: &[Arc<dyn FormatConversionProvider>],
    target: &AudioFormat,
    stream: AudioInputStream,
) -> Result<AudioInputStream, SystemError> {
    if stream.format().matches(target) {
        return Ok(stream);
    }

    let source = stream.format().clone();
    let path = find_conversion_path(converters, &source, target, MAX_CONVERSION_HOPS)
        .ok_or_else(|| unsupported(&source, target))?;
    log::debug!(target: TARGET, "{source} to {target} in {} hop(s)", path.len());

    let mut stream = stream;
    for step in &path {
        stream = converters[step.converter].convert(&step.format, stream)?;
    }
    Ok(stream)
}

fn unsupported(source: &AudioFormat, target: &AudioFormat) -> SystemError {
    SystemError::UnsupportedConversion {
        from: source.to_string(),
        to: target.to_string(),
    }
}
