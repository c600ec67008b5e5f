//! A user-space TCP/IP stack core: bounded byte streams, an out-of-order
//! reassembler, TCP sender/receiver state machines, and an Ethernet/ARP
//! link layer with longest-prefix IPv4 routing between interfaces.
//!
//! Everything is single-threaded and caller-driven: state changes only
//! inside explicit calls (`push`, `receive`, `route`), and time only
//! advances when the owner reports elapsed milliseconds through `tick`.

pub mod config;
pub mod net;
pub mod tcp;
pub mod timer;

pub use net::ethernet::{EthernetAddress, EthernetFrame, ETHERNET_BROADCAST};
pub use net::interface::{NetworkInterface, OutputPort};
pub use net::ipv4::Ipv4Datagram;
pub use net::router::Router;
pub use net::WireError;
pub use tcp::reassembler::Reassembler;
pub use tcp::receiver::TcpReceiver;
pub use tcp::sender::TcpSender;
pub use tcp::seq::SeqNo;
pub use tcp::stream::ByteStream;
pub use tcp::{SegFlags, TcpAck, TcpSegment};
