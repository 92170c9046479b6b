mod envelope;
mod flavor;
mod health;
mod image;
mod instance;
mod zone;

pub use envelope::{Envelope, EnvelopeOutcome, ErrorBody, ErrorCode, RawEnvelope, RemoteError};
pub use flavor::{Flavor, FlavorPrice, FlavorSpec, Price, PriceAmount};
pub use health::HealthResponse;
pub use image::{Image, ImageOs};
pub use instance::{
    ConnectionLimit, CreateInstanceRequest, DefaultAccount, Instance, InstanceAction,
    InstanceFlavor, InstanceImage, InstanceVolume, InstanceZone, IpAttachment,
    ListInstancesQuery, Monitoring, PrivateIp, PublicIp, Traffic, Vnc,
};
pub use zone::Zone;
