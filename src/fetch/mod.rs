pub mod cancel;
pub mod checksum;
pub mod disk;
pub mod manager;
pub mod progress;
pub mod report;
pub mod session;
pub mod transport;

pub use cancel::CancelHandle;
pub use manager::{FetchManager, ManagedFile};
pub use progress::{
    CallbackObserver, ChannelObserver, FetchEvent, ObserverId, ProgressEvent, ProgressObserver,
};
pub use report::{AssetOutcome, FetchReport};
pub use session::DownloadSession;
pub use transport::{ChunkStream, HttpTransport, Transport, TransportResponse};
