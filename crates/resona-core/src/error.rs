use resona_ports::midi::MidiError;
use resona_ports::provider::ProviderError;
use resona_ports::sampled::LineError;

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    #[error("no matching device: {0}")]
    NoMatchingDevice(String),
    #[error("no matching mixer: {0}")]
    NoMatchingMixer(String),
    #[error("unsupported conversion: {to} from {from}")]
    UnsupportedConversion { from: String, to: String },
    #[error("unrecognized stream format: {0}")]
    UnrecognizedStreamFormat(String),
    #[error("midi error: {0}")]
    Midi(#[from] MidiError),
    #[error("line error: {0}")]
    Line(#[from] LineError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(String),
}
