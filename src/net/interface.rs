//! The boundary between the internet layer and the link layer. Outbound
//! datagrams are framed for the next hop's MAC, resolving it over ARP
//! first when necessary; inbound frames are filtered by destination and
//! demultiplexed into the received-datagram queue or the ARP machinery.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::rc::Rc;

use etherparse::EtherType;
use log::{debug, trace};

use super::arp::{ArpMessage, ArpOpcode};
use super::ethernet::{format_mac, EthernetAddress, EthernetFrame, ETHERNET_BROADCAST};
use super::ipv4::Ipv4Datagram;
use crate::config::{ARP_ENTRY_TTL_MS, ARP_REQUEST_TTL_MS};
use crate::timer::AgeTimer;

/// Physical egress for Ethernet frames. Implementations must not block;
/// there is no error channel.
pub trait OutputPort {
    fn transmit(&mut self, sender: &str, frame: &EthernetFrame);
}

pub struct NetworkInterface {
    name: String,
    port: Rc<RefCell<dyn OutputPort>>,
    mac: EthernetAddress,
    ip: Ipv4Addr,
    datagrams_received: VecDeque<Ipv4Datagram>,
    // resolved next hops, each aged out after ARP_ENTRY_TTL_MS
    arp_cache: HashMap<u32, (EthernetAddress, AgeTimer)>,
    // datagrams parked until their next hop resolves
    waiting: HashMap<u32, Vec<Ipv4Datagram>>,
    // an entry here means a request for that IP is in flight; expiry
    // permits a fresh request on the next send
    waiting_timer: HashMap<u32, AgeTimer>,
}

impl NetworkInterface {
    pub fn new(
        name: impl Into<String>,
        port: Rc<RefCell<dyn OutputPort>>,
        mac: EthernetAddress,
        ip: Ipv4Addr,
    ) -> Self {
        let name = name.into();
        debug!("interface {name}: ethernet {} ip {ip}", format_mac(&mac));
        Self {
            name,
            port,
            mac,
            ip,
            datagrams_received: VecDeque::new(),
            arp_cache: HashMap::new(),
            waiting: HashMap::new(),
            waiting_timer: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mac(&self) -> EthernetAddress {
        self.mac
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Datagrams accepted from the wire, oldest first. The owner drains
    /// this.
    pub fn datagrams_received(&mut self) -> &mut VecDeque<Ipv4Datagram> {
        &mut self.datagrams_received
    }

    /// Send `dgram` towards `next_hop`, framing it immediately when the
    /// hop's MAC is cached and parking it behind an ARP request otherwise.
    pub fn send_datagram(&mut self, dgram: Ipv4Datagram, next_hop: Ipv4Addr) {
        let hop = u32::from(next_hop);

        if let Some((mac, _)) = self.arp_cache.get(&hop) {
            let frame = EthernetFrame::new(*mac, self.mac, EtherType::IPV4, dgram.serialize());
            self.transmit(frame);
            return;
        }

        self.waiting.entry(hop).or_default().push(dgram);

        // a request for this hop is already in flight
        if self.waiting_timer.contains_key(&hop) {
            return;
        }
        self.waiting_timer.insert(hop, AgeTimer::default());

        trace!("interface {}: arp who-has {next_hop}", self.name);
        let request = self.make_arp(ArpOpcode::Request, [0; 6], hop);
        self.transmit(EthernetFrame::new(
            ETHERNET_BROADCAST,
            self.mac,
            EtherType::ARP,
            request.serialize(),
        ));
    }

    /// Accept one frame from the wire. IPv4 payloads are queued for the
    /// owner; ARP traffic teaches the cache, may deserve a reply, and
    /// releases any datagrams parked on the sender's address.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) {
        if frame.header.destination != self.mac && frame.header.destination != ETHERNET_BROADCAST {
            return;
        }

        if frame.header.ether_type == EtherType::IPV4 {
            match Ipv4Datagram::parse(&frame.payload) {
                Ok(dgram) => self.datagrams_received.push_back(dgram),
                Err(err) => trace!("interface {}: dropping ipv4 frame: {err}", self.name),
            }
            return;
        }

        if frame.header.ether_type == EtherType::ARP {
            let msg = match ArpMessage::parse(&frame.payload) {
                Ok(msg) => msg,
                Err(err) => {
                    trace!("interface {}: dropping arp frame: {err}", self.name);
                    return;
                }
            };

            // learn from every ARP seen, refreshing stale entries
            self.arp_cache
                .insert(msg.sender_ip, (msg.sender_mac, AgeTimer::default()));

            if msg.opcode == ArpOpcode::Request && msg.target_ip == u32::from(self.ip) {
                let reply = self.make_arp(ArpOpcode::Reply, msg.sender_mac, msg.sender_ip);
                self.transmit(EthernetFrame::new(
                    msg.sender_mac,
                    self.mac,
                    EtherType::ARP,
                    reply.serialize(),
                ));
            }

            if let Some(parked) = self.waiting.remove(&msg.sender_ip) {
                trace!(
                    "interface {}: {} is-at {}, flushing {} datagram(s)",
                    self.name,
                    msg.sender_addr(),
                    format_mac(&msg.sender_mac),
                    parked.len()
                );
                for dgram in parked {
                    self.transmit(EthernetFrame::new(
                        msg.sender_mac,
                        self.mac,
                        EtherType::IPV4,
                        dgram.serialize(),
                    ));
                }
                self.waiting_timer.remove(&msg.sender_ip);
            }
        }
    }

    /// Age the ARP cache and the outstanding-request timers.
    pub fn tick(&mut self, ms: u64) {
        self.arp_cache
            .retain(|_, (_, timer)| !timer.tick(ms).expired(ARP_ENTRY_TTL_MS));
        self.waiting_timer
            .retain(|_, timer| !timer.tick(ms).expired(ARP_REQUEST_TTL_MS));
    }

    fn transmit(&self, frame: EthernetFrame) {
        self.port.borrow_mut().transmit(&self.name, &frame);
    }

    fn make_arp(&self, opcode: ArpOpcode, target_mac: EthernetAddress, target_ip: u32) -> ArpMessage {
        ArpMessage {
            opcode,
            sender_mac: self.mac,
            sender_ip: u32::from(self.ip),
            target_mac,
            target_ip,
        }
    }
}
