//! Provider cascade shared by MIDI device and mixer resolution.

use crate::preference::Preference;
use resona_ports::midi::{MidiDevice, MidiDeviceProvider};
use resona_ports::provider::ProviderError;
use resona_ports::sampled::{Mixer, MixerProvider};
use resona_ports::types::DeviceInfo;
use std::fmt::Debug;
use std::sync::Arc;

const TARGET: &str = "resona::resolver";

/// A provider seen as an ordered list of instantiable candidates.
pub(crate) trait Candidates {
    type Instance;

    fn provider_name(&self) -> &str;
    fn candidate_infos(&self) -> Vec<DeviceInfo>;
    fn supports(&self, info: &DeviceInfo) -> bool;
    fn instantiate(&self, info: &DeviceInfo) -> Result<Self::Instance, ProviderError>;
}

impl Candidates for dyn MidiDeviceProvider {
    type Instance = Arc<dyn MidiDevice>;

    fn provider_name(&self) -> &str {
        MidiDeviceProvider::type_name(self)
    }

    fn candidate_infos(&self) -> Vec<DeviceInfo> {
        self.device_infos()
    }

    fn supports(&self, info: &DeviceInfo) -> bool {
        self.is_device_supported(info)
    }

    fn instantiate(&self, info: &DeviceInfo) -> Result<Self::Instance, ProviderError> {
        self.device(info)
    }
}

impl Candidates for dyn MixerProvider {
    type Instance = Arc<dyn Mixer>;

    fn provider_name(&self) -> &str {
        MixerProvider::type_name(self)
    }

    fn candidate_infos(&self) -> Vec<DeviceInfo> {
        self.mixer_infos()
    }

    fn supports(&self, info: &DeviceInfo) -> bool {
        self.is_mixer_supported(info)
    }

    fn instantiate(&self, info: &DeviceInfo) -> Result<Self::Instance, ProviderError> {
        self.mixer(Some(info))
    }
}

/// Runs the default-instance cascade:
///
/// 1. the preferred provider's named instance, then its first acceptable one
/// 2. the named instance in any provider
/// 3. the first acceptable instance in any provider
///
/// Each step tries every pass in order before moving on, so a later
/// (looser) pass can win an earlier step over a stricter pass of a later
/// step. Instantiation failures are logged and skipped.
pub(crate) fn resolve<P, A>(
    providers: &[Arc<P>],
    preference: &Preference,
    passes: &[A],
    accept: impl Fn(&A, &P::Instance) -> bool,
) -> Option<P::Instance>
where
    P: Candidates + ?Sized,
    A: Debug,
{
    let instance_name = preference.instance_name.as_deref();

    if let Some(provider_type) = preference.provider_type.as_deref() {
        match providers.iter().find(|p| p.provider_name() == provider_type) {
            Some(provider) => {
                if let Some(name) = instance_name {
                    for pass in passes {
                        if let Some(found) = named(provider.as_ref(), name, |i| accept(pass, i)) {
                            return Some(found);
                        }
                    }
                    log::debug!(target: TARGET, "{provider_type} has no instance named {name:?}");
                }
                for pass in passes {
                    if let Some(found) = first(provider.as_ref(), |i| accept(pass, i)) {
                        return Some(found);
                    }
                }
                log::debug!(target: TARGET, "{provider_type} has no acceptable instance");
            }
            None => log::debug!(target: TARGET, "preferred provider {provider_type} is not installed"),
        }
    }

    if let Some(name) = instance_name {
        for pass in passes {
            for provider in providers {
                if let Some(found) = named(provider.as_ref(), name, |i| accept(pass, i)) {
                    return Some(found);
                }
            }
        }
        log::debug!(target: TARGET, "no provider has an acceptable instance named {name:?}");
    }

    for pass in passes {
        for provider in providers {
            if let Some(found) = first(provider.as_ref(), |i| accept(pass, i)) {
                return Some(found);
            }
        }
        log::debug!(target: TARGET, "no acceptable instance in {pass:?} pass");
    }

    None
}

fn named<P>(provider: &P, name: &str, accept: impl Fn(&P::Instance) -> bool) -> Option<P::Instance>
where
    P: Candidates + ?Sized,
{
    provider
        .candidate_infos()
        .iter()
        .filter(|info| info.name == name)
        .find_map(|info| instantiate_if(provider, info, &accept))
}

fn first<P>(provider: &P, accept: impl Fn(&P::Instance) -> bool) -> Option<P::Instance>
where
    P: Candidates + ?Sized,
{
    provider
        .candidate_infos()
        .iter()
        .find_map(|info| instantiate_if(provider, info, &accept))
}

fn instantiate_if<P>(
    provider: &P,
    info: &DeviceInfo,
    accept: &impl Fn(&P::Instance) -> bool,
) -> Option<P::Instance>
where
    P: Candidates + ?Sized,
{
    match provider.instantiate(info) {
        Ok(instance) => accept(&instance).then_some(instance),
        Err(err) => {
            log::warn!(
                target: TARGET,
                "{} failed to instantiate {}: {}",
                provider.provider_name(),
                info.name,
                err
            );
            None
        }
    }
}

/// Every provider's candidates in provider order, then listed order.
pub(crate) fn all_infos<P>(providers: &[Arc<P>]) -> Vec<DeviceInfo>
where
    P: Candidates + ?Sized,
{
    providers
        .iter()
        .flat_map(|provider| provider.candidate_infos())
        .collect()
}

/// First provider that supports `info` and instantiates it.
pub(crate) fn instantiate_any<P>(providers: &[Arc<P>], info: &DeviceInfo) -> Option<P::Instance>
where
    P: Candidates + ?Sized,
{
    providers.iter().find_map(|provider| {
        if !provider.supports(info) {
            return None;
        }
        instantiate_if(provider.as_ref(), info, &|_: &P::Instance| true)
    })
}
