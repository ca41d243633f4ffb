use super::*;
use crate::wire::{ArpOperation, EtherType, EthernetAddress, IpProtocol, Ipv4Address};
use crate::wire::{ArpRepr, Error, Kind, Result, ipv4};

static ARP_FRAME: [u8; 42] =
    [0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
     0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
     0x08, 0x06,
     0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01,
     0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
     192, 168, 1, 1,
     0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
     192, 168, 1, 2];

// 10.0.0.1:4096 -> 10.0.0.2:53 carrying "query", padded to the minimum frame length.
static UDP_FRAME: [u8; 60] =
    [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02, 0x00,
     0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x45, 0x00,
     0x00, 0x21, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11,
     0x26, 0xca, 0x0a, 0x00, 0x00, 0x01, 0x0a, 0x00,
     0x00, 0x02, 0x10, 0x00, 0x00, 0x35, 0x00, 0x0d,
     0x8b, 0xb4, 0x71, 0x75, 0x65, 0x72, 0x79, 0x00,
     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
     0x00, 0x00, 0x00, 0x00];

const IPV4_CHECKSUM: usize = 24;
const UDP_CHECKSUM: usize = 40;

fn strict() -> Dispatcher {
    Dispatcher::standard().with_config(DecodeConfig::new().strict(true))
}

fn host_a() -> EthernetAddress {
    EthernetAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
}

fn udp_builder() -> UdpBuilder {
    let mut udp = UdpBuilder::new();
    udp.src_port(4096).dst_port(53).payload(b"query".to_vec());
    udp
}

fn ipv4_builder(payload: impl Into<Builder>) -> Ipv4Builder {
    let mut ip = Ipv4Builder::new();
    ip.src_addr(Ipv4Address::new(10, 0, 0, 1))
        .dst_addr(Ipv4Address::new(10, 0, 0, 2))
        .payload(payload);
    ip
}

fn frame_builder(payload: impl Into<Builder>) -> EthernetBuilder {
    let mut frame = EthernetBuilder::new();
    frame.dst_addr(EthernetAddress::BROADCAST)
        .src_addr(host_a())
        .payload(payload);
    frame
}

fn arp_builder() -> ArpBuilder {
    let mut arp = ArpBuilder::new();
    arp.operation(ArpOperation::REQUEST)
        .source_hardware_addr(host_a())
        .source_protocol_addr(Ipv4Address::new(192, 168, 1, 1))
        .target_hardware_addr(EthernetAddress([0; 6]))
        .target_protocol_addr(Ipv4Address::new(192, 168, 1, 2));
    arp
}

#[test]
fn decode_arp_frame() {
    let packet = Packet::decode(&ARP_FRAME).unwrap();
    assert_eq!(packet.layers().count(), 2);
    assert!(packet.trailer().is_empty());

    let arp = packet.inner().unwrap();
    assert_eq!(arp.kind(), Kind::Arp);
    assert_eq!(arp.payload(), &Payload::Empty);
    match arp.header() {
        Header::Arp(repr) => {
            assert_eq!(repr.operation, ArpOperation::REQUEST);
            assert_eq!(repr.source_protocol_addr, Ipv4Address::new(192, 168, 1, 1));
            assert_eq!(repr.target_protocol_addr, Ipv4Address::new(192, 168, 1, 2));
        },
        other => panic!("expected ARP, got {:?}", other),
    }

    assert_eq!(packet.len(), ARP_FRAME.len());
    assert_eq!(packet.to_bytes(), &ARP_FRAME[..]);
}

#[test]
fn ethernet_padding_is_trailer() {
    let mut bytes = ARP_FRAME.to_vec();
    bytes.resize(60, 0);

    let packet = Packet::decode(&bytes).unwrap();
    assert_eq!(packet.trailer(), &[0; 18][..]);
    assert_eq!(packet.payload().len(), 28);
    assert!(packet.inner().unwrap().trailer().is_empty());
    assert_eq!(packet.to_bytes(), bytes);
    assert!(packet.to_string().contains("(18 octets trailer of EthernetII)"));
}

#[test]
fn unknown_ethertype_is_raw() {
    let mut bytes = ARP_FRAME.to_vec();
    bytes[12] = 0x88;
    bytes[13] = 0xb5;

    let packet = Packet::decode(&bytes).unwrap();
    match packet.header() {
        Header::Ethernet(repr) => {
            assert!(!repr.ethertype.is_known());
            assert_eq!(repr.ethertype.code(), 0x88b5);
        },
        other => panic!("expected Ethernet, got {:?}", other),
    }
    assert_eq!(packet.payload(), &Payload::Raw(bytes[14..].to_vec()));
    assert_eq!(packet.inner(), None);
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn truncated_inner_header() {
    // The ARP header lacks its target protocol address.
    let bytes = &ARP_FRAME[..40];
    let packet = Packet::decode(bytes).unwrap();
    assert_eq!(packet.payload(), &Payload::Raw(bytes[14..].to_vec()));
    assert_eq!(packet.to_bytes(), bytes);
    assert!(packet.to_string().contains("(26 octets undecoded)"));

    assert_eq!(strict().decode_frame(bytes), Err(Error::Truncated));
}

#[test]
fn malformed_inner_header() {
    let mut bytes = UDP_FRAME.to_vec();
    // A header length of four words.
    bytes[14] = 0x44;

    let packet = Packet::decode(&bytes).unwrap();
    assert_eq!(packet.inner(), None);
    assert_eq!(packet.to_bytes(), bytes);

    assert_eq!(strict().decode_frame(&bytes), Err(Error::Malformed));
}

#[test]
fn truncated_frame_header() {
    assert_eq!(Packet::decode(&ARP_FRAME[..13]), Err(Error::Truncated));
    assert_eq!(Packet::decode(&[]), Err(Error::Truncated));
}

#[test]
fn decode_udp_frame() {
    let packet = Packet::decode(&UDP_FRAME).unwrap();
    let kinds: Vec<_> = packet.layers().map(Packet::kind).collect();
    assert_eq!(kinds, [Kind::Ethernet, Kind::Ipv4, Kind::Udp]);

    // Ethernet padding after the 33 octets of the IPv4 packet.
    assert_eq!(packet.trailer().len(), 13);

    let ip = packet.find(Kind::Ipv4).unwrap();
    match ip.header() {
        Header::Ipv4(repr) => {
            assert_eq!(repr.total_len, 33);
            assert_eq!(repr.protocol, IpProtocol::UDP);
            assert_eq!(repr.checksum, 0x26ca);
            assert!(repr.dont_frag());
        },
        other => panic!("expected IPv4, got {:?}", other),
    }
    assert!(ip.trailer().is_empty());

    let udp = packet.find(Kind::Udp).unwrap();
    match udp.header() {
        Header::Udp(repr) => {
            assert_eq!(repr.src_port, 4096);
            assert_eq!(repr.dst_port, 53);
            assert_eq!(repr.checksum, 0x8bb4);
        },
        other => panic!("expected UDP, got {:?}", other),
    }
    assert_eq!(udp.payload(), &Payload::Raw(b"query".to_vec()));

    assert!(packet.checksums_valid());
    assert_eq!(packet.to_bytes(), &UDP_FRAME[..]);
}

#[test]
fn display_layers() {
    let packet = Packet::decode(&UDP_FRAME).unwrap();
    let display = packet.to_string();
    let lines: Vec<_> = display.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("EthernetII src=02-00-00-00-00-01"));
    assert!(lines[1].starts_with("\\ IPv4 src=10.0.0.1 dst=10.0.0.2 proto=UDP"));
    assert!(lines[2].starts_with(" \\ UDP src=4096 dst=53 len=5"));
    assert_eq!(lines[3], "  \\ (5 octets undecoded)");
    assert_eq!(lines[4], "\\ (13 octets trailer of EthernetII)");
    assert!(!display.contains("checksum incorrect"));
}

#[test]
fn wrong_ipv4_checksum() {
    let mut bytes = UDP_FRAME.to_vec();
    bytes[IPV4_CHECKSUM] ^= 0xff;

    // Checksums do not stop decoding, not even in strict mode.
    let packet = strict().decode_frame(&bytes).unwrap();
    assert_eq!(packet.layers().count(), 3);
    assert!(!packet.checksums_valid());
    assert_eq!(packet.find(Kind::Ipv4).unwrap().checksum_valid(None), Some(false));
    assert!(packet.to_string().lines().nth(1).unwrap().ends_with(" (checksum incorrect)"));
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn wrong_udp_checksum() {
    let mut bytes = UDP_FRAME.to_vec();
    bytes[UDP_CHECKSUM + 1] ^= 0x01;

    let packet = Packet::decode(&bytes).unwrap();
    assert!(!packet.checksums_valid());
    let udp = packet.find(Kind::Udp).unwrap();
    // Without the enclosing addresses there is nothing to validate against.
    assert_eq!(udp.checksum_valid(None), None);
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn absent_udp_checksum() {
    let mut bytes = UDP_FRAME.to_vec();
    bytes[UDP_CHECKSUM] = 0;
    bytes[UDP_CHECKSUM + 1] = 0;

    let packet = Packet::decode(&bytes).unwrap();
    assert!(packet.checksums_valid());
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn build_udp_frame() {
    let builder = Builder::from(frame_builder(ipv4_builder(udp_builder())));
    assert_eq!(builder.kind(), Some(Kind::Ethernet));
    assert_eq!(builder.build().unwrap(), &UDP_FRAME[..]);

    // Building does not change the builder.
    assert_eq!(builder.build().unwrap(), builder.build().unwrap());

    let packet = builder.build_packet().unwrap();
    assert_eq!(packet, Packet::decode(&UDP_FRAME).unwrap());
}

#[test]
fn build_arp_frame() {
    let mut frame = frame_builder(arp_builder());
    let padded = Builder::from(&mut frame).build().unwrap();
    assert_eq!(padded.len(), 60);
    assert_eq!(&padded[..42], &ARP_FRAME[..]);
    assert_eq!(&padded[42..], &[0; 18][..]);

    frame.trailer(Vec::new());
    assert_eq!(Builder::from(frame).build().unwrap(), &ARP_FRAME[..]);
}

#[test]
fn build_explicit_fields() {
    let mut udp = udp_builder();
    udp.checksum(0);
    let mut ip = ipv4_builder(udp);
    ip.ident(0x1234).hop_limit(1).dscp(46).checksum(0xbeef);
    let mut frame = frame_builder(ip);
    frame.ethertype(EtherType::lookup(0x88b5)).trailer(vec![0xfe; 4]);

    let bytes = Builder::from(frame).build().unwrap();
    assert_eq!(&bytes[12..14], &[0x88, 0xb5]);
    assert_eq!(&bytes[IPV4_CHECKSUM..IPV4_CHECKSUM + 2], &[0xbe, 0xef]);
    assert_eq!(&bytes[UDP_CHECKSUM..UDP_CHECKSUM + 2], &[0, 0]);
    assert_eq!(&bytes[bytes.len() - 4..], &[0xfe; 4]);
    assert_eq!(bytes.len(), 14 + 33 + 4);

    // Not an EtherType we decode, the frame keeps everything raw.
    let packet = Packet::decode(&bytes).unwrap();
    assert_eq!(packet.inner(), None);
    assert!(packet.trailer().is_empty());
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn build_ipv4_options_and_trailer() {
    let mut ip = ipv4_builder(udp_builder());
    ip.options(vec![0x01, 0x01, 0x01]).trailer(vec![0xaa; 3]);
    let bytes = Builder::from(frame_builder(ip)).build().unwrap();
    assert_eq!(bytes.len(), 60);

    let packet = Packet::decode(&bytes).unwrap();
    assert!(packet.checksums_valid());
    let ip = packet.find(Kind::Ipv4).unwrap();
    match ip.header() {
        Header::Ipv4(repr) => {
            assert_eq!(repr.ihl, 6);
            assert_eq!(repr.options, [0x01, 0x01, 0x01, 0x00]);
            assert_eq!(repr.total_len, 24 + 13 + 3);
        },
        other => panic!("expected IPv4, got {:?}", other),
    }
    assert_eq!(ip.trailer(), &[0xaa; 3]);
    assert_eq!(packet.trailer().len(), 60 - 14 - 40);
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn build_mismatched_ihl() {
    let mut ip = ipv4_builder(udp_builder());
    ip.options(vec![0x01; 4]).ihl(5);
    assert_eq!(Builder::from(ip).build(), Err(Error::Malformed));
}

#[test]
fn build_oversized_options() {
    // Eleven words of options leave no header length to describe them.
    let mut ip = ipv4_builder(udp_builder());
    ip.options(vec![0x01; 44]);
    assert_eq!(Builder::from(frame_builder(ip)).build(), Err(Error::Malformed));

    let mut ip = ipv4_builder(udp_builder());
    ip.options(vec![0x01; 236]).ihl(64);
    assert_eq!(Builder::from(frame_builder(ip)).build(), Err(Error::Malformed));

    // The largest header still fits.
    let mut ip = ipv4_builder(udp_builder());
    ip.options(vec![0x01; 40]);
    let packet = Builder::from(ip).build_packet().unwrap();
    assert_eq!(packet.header().header_len(), ipv4::MAX_HEADER_LEN);
}

#[test]
fn build_oversized_ipv4() {
    let mut ip = ipv4_builder(vec![0; 65_515]);
    ip.protocol(IpProtocol::UDP);
    let packet = Builder::from(&mut ip).build_packet().unwrap();
    match packet.header() {
        Header::Ipv4(repr) => assert_eq!(repr.total_len, 0xffff),
        other => panic!("not IPv4: {:?}", other),
    }

    ip.payload(vec![0; 65_516]);
    assert_eq!(Builder::from(&mut ip).build(), Err(Error::Malformed));

    let mut ip = ipv4_builder(vec![0; 70_000]);
    ip.protocol(IpProtocol::UDP);
    assert_eq!(Builder::from(ip).build(), Err(Error::Malformed));
}

#[test]
fn build_oversized_udp() {
    let mut udp = udp_builder();
    udp.payload(vec![0; 65_527]);
    let bytes = Builder::from(&mut udp).build().unwrap();
    assert_eq!(bytes.len(), 0xffff);
    assert_eq!(&bytes[4..6], &[0xff, 0xff]);

    udp.payload(vec![0; 65_530]);
    assert_eq!(Builder::from(&mut udp).build(), Err(Error::Malformed));
    assert_eq!(Builder::from(ipv4_builder(udp)).build(), Err(Error::Malformed));
}

#[test]
fn build_incomplete() {
    let mut frame = EthernetBuilder::new();
    frame.src_addr(host_a()).payload(arp_builder());
    assert_eq!(Builder::from(&mut frame).build(), Err(Error::Incomplete("dst_addr")));

    let mut frame = frame_builder(b"opaque".to_vec());
    assert_eq!(Builder::from(&mut frame).build(), Err(Error::Incomplete("ethertype")));
    frame.ethertype(EtherType::lookup(0x88b5));
    assert!(Builder::from(&mut frame).build().is_ok());

    let mut udp = UdpBuilder::new();
    udp.dst_port(53);
    let ip = ipv4_builder(udp);
    assert_eq!(Builder::from(ip).build(), Err(Error::Incomplete("src_port")));

    let mut arp = ArpBuilder::new();
    arp.source_hardware_addr(host_a());
    assert_eq!(Builder::from(arp).build(), Err(Error::Incomplete("operation")));

    let ip = Ipv4Builder::new();
    assert_eq!(Builder::from(ip).build(), Err(Error::Incomplete("src_addr")));
}

#[test]
fn build_raw() {
    let raw = Builder::Raw(vec![1, 2, 3]);
    assert_eq!(raw.kind(), None);
    assert_eq!(raw.build(), Ok(vec![1, 2, 3]));
    assert_eq!(raw.build_packet(), Err(Error::Unrecognized));
}

#[test]
fn udp_without_ipv4() {
    let packet = Builder::from(udp_builder()).build_packet().unwrap();
    match packet.header() {
        Header::Udp(repr) => {
            assert_eq!(repr.length, 13);
            assert_eq!(repr.checksum, 0);
        },
        other => panic!("expected UDP, got {:?}", other),
    }
}

#[test]
fn rebuild_decoded() {
    let mut bytes = UDP_FRAME.to_vec();
    bytes[IPV4_CHECKSUM] ^= 0xff;
    bytes[UDP_CHECKSUM] ^= 0xff;

    let packet = Packet::decode(&bytes).unwrap();
    let mut builder = packet.builder();
    // All fields are explicit, the wrong checksums are kept.
    assert_eq!(builder.build().unwrap(), bytes);

    builder.recompute_all();
    assert_eq!(builder.build().unwrap(), &UDP_FRAME[..]);
}

#[test]
fn rebuild_with_changed_payload() {
    let packet = Packet::decode(&UDP_FRAME).unwrap();
    let mut udp = udp_builder();
    udp.payload(b"a longer query".to_vec());
    let ip = ipv4_builder(udp);
    let mut frame = frame_builder(ip);
    frame.trailer(Vec::new());

    let mut rebuilt = Builder::from(frame);
    rebuilt.recompute_all();
    let bytes = rebuilt.build().unwrap();
    let reparsed = Packet::decode(&bytes).unwrap();
    assert!(reparsed.checksums_valid());
    assert_ne!(reparsed, packet);
    assert_eq!(reparsed.find(Kind::Udp).unwrap().payload().len(), 14);
    // 56 octets, padded to the minimum frame length.
    assert_eq!(bytes.len(), 60);
    assert_eq!(reparsed.trailer().len(), 4);
}

#[test]
fn fragment_payload_is_raw() {
    let mut ip = ipv4_builder(udp_builder());
    ip.flags(ipv4::FLAG_MORE_FRAGS).ident(7);
    let bytes = Builder::from(frame_builder(ip)).build().unwrap();

    let packet = Packet::decode(&bytes).unwrap();
    let ip = packet.find(Kind::Ipv4).unwrap();
    match ip.header() {
        Header::Ipv4(repr) => assert!(repr.is_fragment()),
        other => panic!("expected IPv4, got {:?}", other),
    }
    assert_eq!(ip.payload().len(), 13);
    assert_eq!(ip.inner(), None);
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn ip_in_ip() {
    let mut inner = ipv4_builder(udp_builder());
    inner.src_addr(Ipv4Address::new(172, 16, 0, 1));
    let outer = ipv4_builder(inner);
    let bytes = Builder::from(frame_builder(outer)).build().unwrap();

    let packet = Packet::decode(&bytes).unwrap();
    let kinds: Vec<_> = packet.layers().map(Packet::kind).collect();
    assert_eq!(kinds, [Kind::Ethernet, Kind::Ipv4, Kind::Ipv4, Kind::Udp]);
    match packet.inner().unwrap().header() {
        Header::Ipv4(repr) => assert_eq!(repr.protocol, IpProtocol::IPV4),
        other => panic!("expected IPv4, got {:?}", other),
    }
    assert!(packet.checksums_valid());

    let shallow = Dispatcher::standard().with_config(DecodeConfig::new().max_depth(2));
    let packet = shallow.decode_frame(&bytes).unwrap();
    assert_eq!(packet.layers().count(), 3);
    let innermost = packet.layers().last().unwrap();
    assert_eq!(innermost.payload().len(), 13);
    assert_eq!(innermost.inner(), None);
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn empty_dispatcher() {
    let dispatcher = Dispatcher::new();
    assert!(!dispatcher.contains(Selector::EtherType(EtherType::ARP)));
    let packet = dispatcher.decode_frame(&ARP_FRAME).unwrap();
    assert_eq!(packet.payload(), &Payload::Raw(ARP_FRAME[14..].to_vec()));
}

#[test]
fn register_decoder() {
    let mut bytes = ARP_FRAME.to_vec();
    bytes[12] = 0x80;
    bytes[13] = 0x35;

    assert_eq!(Packet::decode(&bytes).unwrap().inner(), None);

    let mut dispatcher = Dispatcher::standard();
    let rarp = Selector::EtherType(EtherType::RARP);
    assert!(dispatcher.register(rarp, decode_arp).is_none());
    assert!(dispatcher.contains(rarp));
    let packet = dispatcher.decode_frame(&bytes).unwrap();
    assert_eq!(packet.inner().map(Packet::kind), Some(Kind::Arp));
    assert_eq!(packet.to_bytes(), bytes);

    // Replacing hands back the previous decoder.
    assert!(dispatcher.register(rarp, decode_arp).is_some());

    // The shared dispatcher is unaffected.
    assert!(!Dispatcher::shared().contains(rarp));
}

// Claims one octet more than it was handed.
fn decode_overlong(_: &Dispatcher, bytes: &[u8], _: Context) -> Result<Packet> {
    let (repr, header_len) = ArpRepr::decode(bytes, 0)?;
    let payload = Payload::raw(&bytes[header_len..]);
    Ok(Packet::new(Header::Arp(repr), payload, vec![0]))
}

#[test]
fn overlong_decoder_is_contained() {
    let mut lenient = Dispatcher::standard();
    lenient.register(Selector::EtherType(EtherType::ARP), decode_overlong);
    let packet = lenient.decode_frame(&ARP_FRAME).unwrap();
    assert_eq!(packet.inner(), None);
    assert_eq!(packet.payload().len(), 28);
    assert_eq!(packet.to_bytes(), &ARP_FRAME[..]);

    let mut strict = strict();
    strict.register(Selector::EtherType(EtherType::ARP), decode_overlong);
    assert_eq!(strict.decode_frame(&ARP_FRAME), Err(Error::Malformed));
}

#[test]
fn decode_next_empty() {
    let dispatcher = Dispatcher::shared();
    assert_eq!(
        dispatcher.decode_next(Selector::IpProtocol(IpProtocol::UDP), &[]),
        Ok(Payload::Empty));
    assert_eq!(
        dispatcher.decode_next(Selector::IpProtocol(IpProtocol::TCP), &[1, 2]),
        Ok(Payload::Raw(vec![1, 2])));
}

#[test]
fn decode_next_udp() {
    let udp = &UDP_FRAME[34..47];
    let payload = Dispatcher::shared()
        .decode_next(Selector::IpProtocol(IpProtocol::UDP), udp)
        .unwrap();
    assert_eq!(payload.kind(), Some(Kind::Udp));
    assert_eq!(payload.to_bytes(), udp);
}

#[test]
fn shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Packet>();
    assert_send_sync::<Dispatcher>();
    assert_send_sync::<Builder>();
}
