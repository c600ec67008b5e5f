use std::cell::RefCell;
use std::io;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::rc::Rc;
use std::time::Instant;

use log::{info, trace, warn};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use rand::Rng;

use netstack::net::ethernet::format_mac;
use netstack::{EthernetAddress, EthernetFrame, NetworkInterface, OutputPort};

// Ethernet frame plus a little headroom
const BUFFER_SIZE: usize = 2048;
const POLL_INTERVAL_MS: u16 = 50;

const HOST_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 2);

struct TapPort {
    device: Rc<tun_tap::Iface>,
}

impl OutputPort for TapPort {
    fn transmit(&mut self, sender: &str, frame: &EthernetFrame) {
        let bytes = frame.serialize();
        if let Err(err) = self.device.send(&bytes) {
            warn!("{sender}: failed to transmit {} bytes: {err}", bytes.len());
        }
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    let name = std::env::args().nth(1).unwrap_or_else(|| "tap0".to_string());
    let device = Rc::new(tun_tap::Iface::without_packet_info(
        &name,
        tun_tap::Mode::Tap,
    )?);

    // locally administered unicast MAC
    let mut mac: EthernetAddress = rand::thread_rng().gen();
    mac[0] = (mac[0] | 0x02) & !0x01;

    let port = Rc::new(RefCell::new(TapPort {
        device: device.clone(),
    }));
    let mut iface = NetworkInterface::new(name.as_str(), port, mac, HOST_IP);
    info!("listening on {} ({} / {})", iface.name(), format_mac(&mac), HOST_IP);

    let raw_fd = device.as_raw_fd();
    let mut buf = [0u8; BUFFER_SIZE];
    let mut last_tick = Instant::now();

    loop {
        let fd = unsafe { BorrowedFd::borrow_raw(raw_fd) };
        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        let ready = poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS))?;

        if ready > 0
            && fds[0]
                .revents()
                .is_some_and(|revents| revents.contains(PollFlags::POLLIN))
        {
            let nbytes = device.recv(&mut buf[..])?;
            match EthernetFrame::parse(&buf[..nbytes]) {
                Ok(frame) => iface.recv_frame(&frame),
                Err(err) => trace!("ignoring {nbytes}-byte frame: {err}"),
            }
        }

        let elapsed = last_tick.elapsed().as_millis() as u64;
        if elapsed > 0 {
            last_tick = Instant::now();
            iface.tick(elapsed);
        }

        while let Some(dgram) = iface.datagrams_received().pop_front() {
            info!(
                "delivered {}-byte datagram {} -> {} (ttl {})",
                dgram.payload.len(),
                dgram.source(),
                dgram.destination(),
                dgram.ttl(),
            );
        }
    }
}
