//! Process-wide tables of named protocol numbers.
//!
//! Every namespace of protocol numbers (EtherType, IP protocol number, ARP operation, …) is a
//! small `(code, name)` value type generated by [`named_number!`]. Its known values live in a
//! [`Registry`] that is filled once, from an explicit and ordered list, the first time the
//! namespace is used. It is never mutated afterwards so lookups from any thread need no locking.
//!
//! Lookups never fail. A code that nobody registered resolves to a value named `"unknown"` so
//! that a decoder can carry on with protocols it does not recognize.
//!
//! ```
//! use pktlayer::wire::{EtherType, Kind};
//!
//! assert_eq!(EtherType::lookup(0x0806), EtherType::ARP);
//! assert_eq!(EtherType::lookup(0x0806).name(), "ARP");
//!
//! let other = EtherType::lookup(0xfffe);
//! assert_eq!(other.code(), 0xfffe);
//! assert_eq!(other.name(), "unknown");
//!
//! assert_eq!(EtherType::lookup_by_kind(Kind::Ipv4), Some(EtherType::IPV4));
//! ```
//!
//! [`named_number!`]: ../macro.named_number.html
//! [`Registry`]: struct.Registry.html
use core::fmt;
use core::hash::Hash;
use std::collections::{BTreeMap, HashMap};

use crate::wire::Kind;

/// The name of every value synthesized for an unregistered code.
pub const UNKNOWN: &str = "unknown";

/// A value of a protocol number namespace.
///
/// Implemented by all types generated with [`named_number!`].
///
/// [`named_number!`]: ../macro.named_number.html
pub trait NamedNumber: Copy + 'static {
    /// The fixed-width integer found on the wire.
    type Code: Copy + Ord + Hash + fmt::Debug + fmt::LowerHex;

    /// The numeric code.
    fn code(&self) -> Self::Code;

    /// The symbolic name.
    fn name(&self) -> &'static str;

    /// Synthesize the value for a code without registered name.
    fn unknown(code: Self::Code) -> Self;
}

/// Two values of one namespace claimed the same code.
///
/// This is a defect of the static tables, not of any input data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate {namespace} registration for {code}: `{existing}` conflicts with `{rejected}`")]
pub struct DuplicateRegistration {
    /// The namespace being populated.
    pub namespace: &'static str,
    /// The contested code, formatted as hexadecimal.
    pub code: String,
    /// The name that was registered first.
    pub existing: &'static str,
    /// The name that was refused.
    pub rejected: &'static str,
}

/// The known values of one protocol number namespace.
#[derive(Debug)]
pub struct Registry<V: NamedNumber> {
    namespace: &'static str,
    by_code: BTreeMap<V::Code, V>,
    by_kind: HashMap<Kind, V>,
}

impl<V: NamedNumber> Registry<V> {
    /// Create an empty registry for a namespace.
    pub fn new(namespace: &'static str) -> Self {
        Registry {
            namespace,
            by_code: BTreeMap::new(),
            by_kind: HashMap::new(),
        }
    }

    /// The name of the namespace, used in diagnostics.
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Add a value, refusing a code that is already taken.
    pub fn try_register(&mut self, value: V) -> Result<(), DuplicateRegistration> {
        if let Some(existing) = self.by_code.get(&value.code()) {
            return Err(DuplicateRegistration {
                namespace: self.namespace,
                code: format!("{:#x}", value.code()),
                existing: existing.name(),
                rejected: value.name(),
            });
        }

        net_trace!("registry {}: {:#x} => {}", self.namespace, value.code(), value.name());
        self.by_code.insert(value.code(), value);
        Ok(())
    }

    /// Add a value.
    ///
    /// # Panics
    /// This function panics if the code of `value` is already registered. Registration happens
    /// from static tables, a duplicate is a programming error.
    pub fn register(&mut self, value: V) {
        if let Err(err) = self.try_register(value) {
            panic!("{}", err);
        }
    }

    /// Associate a packet kind with the value that announces it.
    ///
    /// # Panics
    /// This function panics if the kind already has a value in this namespace.
    pub fn register_kind(&mut self, kind: Kind, value: V) {
        if let Some(existing) = self.by_kind.insert(kind, value) {
            panic!("duplicate {} registration for {:?}: `{}` conflicts with `{}`",
                self.namespace, kind, existing.name(), value.name());
        }
    }

    /// Find the value of a code, synthesizing an unknown value if necessary.
    pub fn lookup(&self, code: V::Code) -> V {
        match self.by_code.get(&code) {
            Some(value) => *value,
            None => V::unknown(code),
        }
    }

    /// Find the value an enclosing header uses to announce a packet of some kind.
    pub fn lookup_by_kind(&self, kind: Kind) -> Option<V> {
        self.by_kind.get(&kind).copied()
    }

    /// Query whether a code has been registered.
    pub fn contains(&self, code: V::Code) -> bool {
        self.by_code.contains_key(&code)
    }

    /// All registered values, ordered by code.
    pub fn values(&self) -> impl Iterator<Item=V> + '_ {
        self.by_code.values().copied()
    }

    /// The number of registered values.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Query whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::{ArpOperation, EtherType, IpProtocol};

    named_number! {
        /// A namespace only used in tests.
        pub struct Sample(u16) {
            FIRST = 1 => "first",
            SECOND = 2 => "second",
        }
    }

    #[test]
    fn lookup_known() {
        assert_eq!(EtherType::lookup(0x0800), EtherType::IPV4);
        assert_eq!(EtherType::lookup(0x0800).name(), "IPv4");
        assert!(EtherType::IPV4.is_known());
        assert_eq!(IpProtocol::lookup(17).name(), "UDP");
    }

    #[test]
    fn lookup_unknown() {
        let value = EtherType::lookup(0xfffe);
        assert_eq!(value.code(), 0xfffe);
        assert_eq!(value.name(), UNKNOWN);
        assert!(!value.is_known());
        assert_eq!(format!("{}", value), "0xfffe (unknown)");
    }

    #[test]
    fn equality_by_code() {
        assert_eq!(EtherType::new(0x0806, "something else"), EtherType::ARP);
        assert!(EtherType::IPV4 < EtherType::ARP);
        assert!(ArpOperation::REQUEST < ArpOperation::REPLY);
    }

    #[test]
    fn lookup_by_kind() {
        assert_eq!(EtherType::lookup_by_kind(Kind::Arp), Some(EtherType::ARP));
        assert_eq!(EtherType::lookup_by_kind(Kind::Ipv4), Some(EtherType::IPV4));
        assert_eq!(EtherType::lookup_by_kind(Kind::Udp), None);
        assert_eq!(IpProtocol::lookup_by_kind(Kind::Udp), Some(IpProtocol::UDP));
    }

    #[test]
    fn values_ordered() {
        let codes: Vec<u16> = EtherType::registry().values().map(|v| v.code()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
        assert!(EtherType::registry().len() >= 9);
    }

    #[test]
    fn duplicate_refused() {
        let mut registry = Registry::new("Sample");
        registry.register(Sample::FIRST);
        let err = registry.try_register(Sample::new(1, "again")).unwrap_err();
        assert_eq!(err.existing, "first");
        assert_eq!(err.rejected, "again");
        assert_eq!(err.code, "0x1");
        assert!(registry.try_register(Sample::SECOND).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    #[should_panic(expected = "duplicate")]
    fn duplicate_panics() {
        let mut registry = Registry::new("Sample");
        registry.register(Sample::FIRST);
        registry.register(Sample::new(1, "again"));
    }

    #[test]
    fn generated_registry() {
        assert_eq!(Sample::lookup(2), Sample::SECOND);
        assert_eq!(Sample::registry().namespace(), "Sample");
        assert_eq!(format!("{:?}", Sample::FIRST), "Sample(0x0001, \"first\")");
        assert_eq!(u16::from(Sample::SECOND), 2);
        assert_eq!(Sample::from(3).name(), UNKNOWN);
    }
}
