//! Longest-prefix-match IPv4 forwarding between owned interfaces.
//!
//! The table keeps one map per prefix length. A route's key is its prefix
//! with the high-order `length` bits rotated into the low end, so a
//! candidate address can be probed against every length by rotating it the
//! same way — one right-shift per step down the lengths.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use log::{debug, trace};

use super::interface::NetworkInterface;

#[derive(Debug, Clone, Copy)]
struct Route {
    interface_idx: usize,
    // None means the destination network is directly attached
    next_hop: Option<Ipv4Addr>,
}

pub struct Router {
    interfaces: Vec<NetworkInterface>,
    table: [HashMap<u32, Route>; 33],
}

impl Router {
    pub fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            table: std::array::from_fn(|_| HashMap::new()),
        }
    }

    /// Take ownership of `iface`; the returned index names it in routes.
    pub fn add_interface(&mut self, iface: NetworkInterface) -> usize {
        self.interfaces.push(iface);
        self.interfaces.len() - 1
    }

    pub fn interface(&self, idx: usize) -> &NetworkInterface {
        &self.interfaces[idx]
    }

    pub fn interface_mut(&mut self, idx: usize) -> &mut NetworkInterface {
        &mut self.interfaces[idx]
    }

    /// Register `prefix/length` as reachable through interface
    /// `interface_idx`, via `next_hop` unless directly attached.
    pub fn add_route(
        &mut self,
        prefix: Ipv4Addr,
        length: u8,
        next_hop: Option<Ipv4Addr>,
        interface_idx: usize,
    ) {
        debug!(
            "route {prefix}/{length} => {} on interface {interface_idx}",
            next_hop.map_or_else(|| "(direct)".to_string(), |hop| hop.to_string()),
        );
        let key = u32::from(prefix).rotate_right(32 - u32::from(length));
        self.table[usize::from(length)].insert(key, Route {
            interface_idx,
            next_hop,
        });
    }

    /// Drain every interface's inbound queue and forward each datagram out
    /// the best-matching route, spending one hop of TTL.
    pub fn route(&mut self) {
        for idx in 0..self.interfaces.len() {
            while let Some(mut dgram) = self.interfaces[idx].datagrams_received().pop_front() {
                if dgram.ttl() <= 1 {
                    trace!("ttl exhausted for {}", dgram.destination());
                    continue;
                }
                dgram.decrement_ttl();

                let Some(route) = self.lookup(dgram.destination()) else {
                    trace!("no route to {}", dgram.destination());
                    continue;
                };
                let next_hop = route.next_hop.unwrap_or_else(|| dgram.destination());
                self.interfaces[route.interface_idx].send_datagram(dgram, next_hop);
            }
        }
    }

    /// Most-specific match wins; lengths are probed from 32 down to the
    /// default route.
    fn lookup(&self, addr: Ipv4Addr) -> Option<Route> {
        let mut probe = u32::from(addr);
        for length in (0..=32).rev() {
            if let Some(route) = self.table[length].get(&probe) {
                return Some(*route);
            }
            probe >>= 1;
        }
        None
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::DEFAULT_TTL;
    use crate::net::arp::{ArpMessage, ArpOpcode};
    use crate::net::ethernet::{EthernetAddress, EthernetFrame, ETHERNET_BROADCAST};
    use crate::net::ipv4::Ipv4Datagram;
    use crate::net::testutil::{capture, CapturePort};
    use etherparse::{EtherType, IpNumber};

    const IF0_MAC: EthernetAddress = [0x02, 0, 0, 0, 0, 0x10];
    const IF1_MAC: EthernetAddress = [0x02, 0, 0, 0, 0, 0x11];
    const HOST_MAC: EthernetAddress = [0x02, 0, 0, 0, 0, 0x99];

    fn router() -> (Router, Rc<RefCell<CapturePort>>, Rc<RefCell<CapturePort>>) {
        let port0 = capture();
        let port1 = capture();
        let mut router = Router::new();
        router.add_interface(NetworkInterface::new(
            "if0",
            port0.clone(),
            IF0_MAC,
            Ipv4Addr::new(192, 168, 0, 1),
        ));
        router.add_interface(NetworkInterface::new(
            "if1",
            port1.clone(),
            IF1_MAC,
            Ipv4Addr::new(10, 0, 0, 1),
        ));
        router.add_route(Ipv4Addr::new(0, 0, 0, 0), 0, Some(Ipv4Addr::new(192, 168, 0, 254)), 0);
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 8, None, 1);
        (router, port0, port1)
    }

    fn datagram(dst: Ipv4Addr, ttl: u8) -> Ipv4Datagram {
        Ipv4Datagram::new(Ipv4Addr::new(172, 16, 0, 5), dst, IpNumber::UDP, ttl, b"x".to_vec())
            .unwrap()
    }

    /// Resolve the pending ARP request on `port` by replying from
    /// `sender_ip` with `sender_mac`, then return the flushed IPv4 frames.
    fn answer_arp(
        router: &mut Router,
        idx: usize,
        port: &Rc<RefCell<CapturePort>>,
        sender_ip: Ipv4Addr,
        sender_mac: EthernetAddress,
    ) -> Vec<EthernetFrame> {
        {
            let frames = &port.borrow().frames;
            let last = frames.last().expect("an arp request");
            assert_eq!(last.header.ether_type, EtherType::ARP);
            assert_eq!(last.header.destination, ETHERNET_BROADCAST);
            let request = ArpMessage::parse(&last.payload).unwrap();
            assert_eq!(request.opcode, ArpOpcode::Request);
            assert_eq!(request.target_addr(), sender_ip);
        }
        port.borrow_mut().frames.clear();

        let reply = ArpMessage {
            opcode: ArpOpcode::Reply,
            sender_mac,
            sender_ip: u32::from(sender_ip),
            target_mac: router.interface(idx).mac(),
            target_ip: u32::from(router.interface(idx).ip()),
        };
        let frame = EthernetFrame::new(
            router.interface(idx).mac(),
            sender_mac,
            EtherType::ARP,
            reply.serialize(),
        );
        router.interface_mut(idx).recv_frame(&frame);
        let out = port.borrow().frames.clone();
        port.borrow_mut().frames.clear();
        out
    }

    #[test]
    fn longer_prefix_wins() {
        let (mut router, port0, port1) = router();
        router
            .interface_mut(0)
            .datagrams_received()
            .push_back(datagram(Ipv4Addr::new(10, 5, 5, 5), DEFAULT_TTL));
        router.route();

        // matched 10.0.0.0/8: if1 asks for the (directly attached)
        // destination itself
        assert!(port0.borrow().frames.is_empty());
        let flushed = answer_arp(
            &mut router,
            1,
            &port1,
            Ipv4Addr::new(10, 5, 5, 5),
            HOST_MAC,
        );
        assert_eq!(flushed.len(), 1);
        let dgram = Ipv4Datagram::parse(&flushed[0].payload).unwrap();
        assert_eq!(dgram.destination(), Ipv4Addr::new(10, 5, 5, 5));
        assert_eq!(dgram.ttl(), DEFAULT_TTL - 1);
    }

    #[test]
    fn default_route_catches_the_rest() {
        let (mut router, port0, port1) = router();
        router
            .interface_mut(1)
            .datagrams_received()
            .push_back(datagram(Ipv4Addr::new(8, 8, 8, 8), DEFAULT_TTL));
        router.route();

        // matched 0.0.0.0/0: if0 resolves the configured gateway
        assert!(port1.borrow().frames.is_empty());
        let flushed = answer_arp(
            &mut router,
            0,
            &port0,
            Ipv4Addr::new(192, 168, 0, 254),
            HOST_MAC,
        );
        assert_eq!(flushed.len(), 1);
        assert_eq!(
            Ipv4Datagram::parse(&flushed[0].payload).unwrap().destination(),
            Ipv4Addr::new(8, 8, 8, 8)
        );
    }

    #[test]
    fn expired_ttl_is_dropped() {
        let (mut router, port0, port1) = router();
        router
            .interface_mut(0)
            .datagrams_received()
            .push_back(datagram(Ipv4Addr::new(10, 5, 5, 5), 1));
        router
            .interface_mut(0)
            .datagrams_received()
            .push_back(datagram(Ipv4Addr::new(10, 5, 5, 5), 0));
        router.route();
        assert!(port0.borrow().frames.is_empty());
        assert!(port1.borrow().frames.is_empty());
    }

    #[test]
    fn unroutable_destinations_are_dropped() {
        let port = capture();
        let mut router = Router::new();
        router.add_interface(NetworkInterface::new(
            "if0",
            port.clone(),
            IF0_MAC,
            Ipv4Addr::new(192, 168, 0, 1),
        ));
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 8, None, 0);

        router
            .interface_mut(0)
            .datagrams_received()
            .push_back(datagram(Ipv4Addr::new(8, 8, 8, 8), DEFAULT_TTL));
        router.route();
        assert!(port.borrow().frames.is_empty());
    }

    #[test]
    fn exact_host_route_beats_the_subnet() {
        let (mut router, _port0, port1) = router();
        // /32 through if1 via a distinct gateway
        let gateway = Ipv4Addr::new(10, 0, 0, 42);
        router.add_route(Ipv4Addr::new(10, 5, 5, 5), 32, Some(gateway), 1);

        router
            .interface_mut(0)
            .datagrams_received()
            .push_back(datagram(Ipv4Addr::new(10, 5, 5, 5), DEFAULT_TTL));
        router.route();

        // the ARP request names the /32 route's gateway, not the
        // destination the /8 would have used
        let frames = &port1.borrow().frames;
        let request = ArpMessage::parse(&frames.last().unwrap().payload).unwrap();
        assert_eq!(request.target_addr(), gateway);
    }
}
