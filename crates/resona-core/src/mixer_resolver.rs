use crate::cascade;
use crate::error::SystemError;
use crate::preference::Preference;
use resona_ports::sampled::{
    AudioFormat, LineInfo, LineKind, Mixer, MixerProvider, SourceDataLine, TargetDataLine,
};
use resona_ports::types::DeviceInfo;
use std::sync::Arc;

const TARGET: &str = "resona::resolver";

#[derive(Debug)]
struct SupportsLine;

pub fn mixer_infos(providers: &[Arc<dyn MixerProvider>]) -> Vec<DeviceInfo> {
    cascade::all_infos(providers)
}

/// Asks every provider for `info` in turn. With `None`, a provider that has
/// no default of its own may still hand out one of its listed mixers.
pub fn mixer(
    providers: &[Arc<dyn MixerProvider>],
    info: Option<&DeviceInfo>,
) -> Result<Arc<dyn Mixer>, SystemError> {
    for provider in providers {
        if info.is_some_and(|info| !provider.is_mixer_supported(info)) {
            continue;
        }
        match provider.mixer(info) {
            Ok(mixer) => return Ok(mixer),
            Err(err) => log::debug!(target: TARGET, "{}: {}", provider.type_name(), err),
        }
    }

    if info.is_none() {
        for provider in providers {
            for candidate in provider.mixer_infos() {
                match provider.mixer(Some(&candidate)) {
                    Ok(mixer) => return Ok(mixer),
                    Err(err) => log::warn!(
                        target: TARGET,
                        "{} failed to instantiate {}: {}",
                        provider.type_name(),
                        candidate.name,
                        err
                    ),
                }
            }
        }
    }

    Err(SystemError::NoMatchingMixer(match info {
        Some(info) => format!("requested mixer not installed: {info}"),
        None => "no mixer available".to_string(),
    }))
}

/// Default mixer able to supply a line like `requested`.
pub fn resolve_line_mixer(
    providers: &[Arc<dyn MixerProvider>],
    preference: &Preference,
    requested: &LineInfo,
) -> Result<Arc<dyn Mixer>, SystemError> {
    cascade::resolve(providers, preference, &[SupportsLine], |_, mixer| {
        mixer.is_line_supported(requested)
    })
    .ok_or_else(|| {
        let formats: Vec<String> = requested.formats.iter().map(ToString::to_string).collect();
        SystemError::NoMatchingMixer(format!(
            "no mixer supports a {:?} line for [{}]",
            requested.kind,
            formats.join("; ")
        ))
    })
}

/// An unopened playback line carrying `format`.
pub fn source_data_line(
    providers: &[Arc<dyn MixerProvider>],
    preference: &Preference,
    format: &AudioFormat,
) -> Result<Box<dyn SourceDataLine>, SystemError> {
    let requested = LineInfo::for_format(LineKind::SourceData, format.clone());
    let mixer = resolve_line_mixer(providers, preference, &requested)?;
    log::debug!(target: TARGET, "source line for {format} from {}", mixer.info().name);
    Ok(mixer.source_line(&requested)?)
}

/// An unopened capture line carrying `format`.
pub fn target_data_line(
    providers: &[Arc<dyn MixerProvider>],
    preference: &Preference,
    format: &AudioFormat,
) -> Result<Box<dyn TargetDataLine>, SystemError> {
    let requested = LineInfo::for_format(LineKind::TargetData, format.clone());
    let mixer = resolve_line_mixer(providers, preference, &requested)?;
    log::debug!(target: TARGET, "target line for {format} from {}", mixer.info().name);
    Ok(mixer.target_line(&requested)?)
}

pub fn is_line_supported(providers: &[Arc<dyn MixerProvider>], requested: &LineInfo) -> bool {
    providers.iter().any(|provider| {
        provider.mixer_infos().iter().any(|info| {
            provider
                .mixer(Some(info))
                .is_ok_and(|mixer| mixer.is_line_supported(requested))
        })
    })
}
