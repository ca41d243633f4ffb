/// Define a protocol number namespace with registered, named values.
///
/// Most network protocols define fields where not all bit-patterns are standardized values. In
/// some cases these are invalid while others allocate them through some registrar (such as IANA).
/// This macro defines a `(code, name)` value type for such a field, one `const` per known value
/// and a process-wide [`Registry`] that is populated from the listed values, in order, on first
/// access. Codes that are not registered still convert, into a value named `"unknown"`.
///
/// An optional `kinds` block maps the structural kind of a packet to the value an enclosing layer
/// should use when it builds a header around such a packet.
///
/// [`Registry`]: registry/struct.Registry.html
///
/// # Example
///
/// ```
/// # use pktlayer::named_number;
/// named_number! {
///     /// Version field of some header.
///     pub struct Version(u8) {
///         /// The first version.
///         V1 = 1 => "version 1",
///         V2 = 2 => "version 2",
///     }
/// }
///
/// assert_eq!(Version::lookup(2), Version::V2);
/// assert_eq!(Version::lookup(7).name(), "unknown");
/// ```
#[macro_export]
macro_rules! named_number {
    (
        $( #[$attr:meta] )*
        pub struct $name:ident($ty:ty) {
            $(
              $( #[$konst_attr:meta] )*
              $konst:ident = $value:expr => $label:expr
            ),+ $(,)*
        }
        $(
            kinds {
                $( $kind:ident => $kind_konst:ident ),* $(,)*
            }
        )?
    ) => {
        $( #[$attr] )*
        #[derive(Clone, Copy)]
        pub struct $name {
            code: $ty,
            name: &'static str,
        }

        impl $name {
            $(
              $( #[$konst_attr] )*
              pub const $konst: $name = $name::new($value, $label);
            )+

            /// Create a value with an arbitrary name, bypassing the registry.
            pub const fn new(code: $ty, name: &'static str) -> Self {
                $name { code, name }
            }

            /// Create the value used for a code that has no registered name.
            pub const fn unknown(code: $ty) -> Self {
                $name::new(code, $crate::registry::UNKNOWN)
            }

            /// The numeric code, as found on the wire.
            pub const fn code(self) -> $ty {
                self.code
            }

            /// The symbolic name of this value.
            pub const fn name(self) -> &'static str {
                self.name
            }

            /// Query whether the code of this value is registered.
            pub fn is_known(self) -> bool {
                Self::registry().contains(self.code)
            }

            /// Render the code as fixed width hexadecimal, e.g. `0x0800`.
            pub fn code_string(self) -> String {
                format!("0x{:0width$x}", self.code, width = ::core::mem::size_of::<$ty>() * 2)
            }

            /// Find the registered value for a code.
            ///
            /// This never fails, unregistered codes resolve to [`unknown`](#method.unknown).
            pub fn lookup(code: $ty) -> Self {
                Self::registry().lookup(code)
            }

            /// Find the value an enclosing layer uses for a packet of the given kind.
            pub fn lookup_by_kind(kind: $crate::wire::Kind) -> Option<Self> {
                Self::registry().lookup_by_kind(kind)
            }

            /// The process-wide registry of this namespace.
            pub fn registry() -> &'static $crate::registry::Registry<$name> {
                $crate::__private::lazy_static! {
                    static ref REGISTRY: $crate::registry::Registry<$name> = {
                        #[allow(unused_mut)]
                        let mut registry = $crate::registry::Registry::new(stringify!($name));
                        $( registry.register($name::$konst); )+
                        $($( registry.register_kind($crate::wire::Kind::$kind, $name::$kind_konst); )*)?
                        registry
                    };
                }
                &REGISTRY
            }
        }

        impl $crate::registry::NamedNumber for $name {
            type Code = $ty;

            fn code(&self) -> $ty {
                self.code
            }

            fn name(&self) -> &'static str {
                self.name
            }

            fn unknown(code: $ty) -> Self {
                $name::unknown(code)
            }
        }

        impl ::core::convert::From<$ty> for $name {
            fn from(code: $ty) -> Self {
                $name::lookup(code)
            }
        }

        impl ::core::convert::From<$name> for $ty {
            fn from(value: $name) -> Self {
                value.code
            }
        }

        impl ::core::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.code == other.code
            }
        }

        impl ::core::cmp::Eq for $name { }

        impl ::core::cmp::PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<::core::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl ::core::cmp::Ord for $name {
            fn cmp(&self, other: &Self) -> ::core::cmp::Ordering {
                self.code.cmp(&other.code)
            }
        }

        impl ::core::hash::Hash for $name {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                self.code.hash(state)
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                write!(f, "{}({}, {:?})", stringify!($name), self.code_string(), self.name)
            }
        }

        impl ::core::fmt::LowerHex for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                ::core::fmt::LowerHex::fmt(&self.code, f)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                if self.name == $crate::registry::UNKNOWN {
                    write!(f, "{} (unknown)", self.code_string())
                } else {
                    write!(f, "{}", self.name)
                }
            }
        }
    }
}

/// Declare a dynamically sized byte wrapper.
///
/// Use this to create byte slices with inner invariants. This macro performs two basic actions:
/// * Define a type with the indicated structure, documentation, attributes. The type can not have
///   any generic arguments and can only wrap a simple byte slice.
/// * Define two new private methods for conversion from a byte slice:
///   - `fn __from_macro_new_unchecked(&[u8]) -> &Self`
///   - `fn __from_macro_new_unchecked_mut(&mut [u8]) -> &mut Self`
///
/// ## Usage
///
/// You can currently only use a tuple type with a single member, a `[u8]`.
///
/// ```
/// # use pktlayer::byte_wrapper;
/// byte_wrapper! {
///     /// A udp packet.
///     pub struct udp([u8]);
/// }
///
/// impl udp {
///     pub fn from_slice(slice: &[u8]) -> &Self {
///         Self::__from_macro_new_unchecked(slice)
///     }
/// }
///
/// let data = [0x20, 0x00, 0x00, 0x20, 0x00, 0x00, 0x08, 0x00];
/// let _= udp::from_slice(&data);
/// ```
#[macro_export]
macro_rules! byte_wrapper {
    (
        $( #[$attr:meta] )*
        pub struct $name:ident([u8])$(;)*
    ) => {
        #[allow(non_camel_case_types)]
        #[repr(transparent)]
        $( #[$attr] )*
        pub struct $name([u8]);

        impl $name {
            #[allow(dead_code)]
            fn __from_macro_new_unchecked(data: &[u8]) -> &Self {
                // SAFETY: this is safe due to repr(transparent)
                unsafe { &*(data as *const _ as *const Self) }
            }

            #[allow(dead_code)]
            fn __from_macro_new_unchecked_mut(data: &mut [u8]) -> &mut Self {
                // SAFETY: this is safe due to repr(transparent)
                unsafe { &mut *(data as *mut _ as *mut Self) }
            }
        }
    }
}

#[cfg(feature = "log")]
#[macro_use]
mod log {
    macro_rules! net_log {
        (trace, $($arg:expr),*) => { ::log::trace!($($arg),*) };
        (debug, $($arg:expr),*) => { ::log::debug!($($arg),*) };
    }
}

#[cfg(not(feature = "log"))]
#[macro_use]
mod log {
    macro_rules! net_log {
        ($level:ident, $($arg:expr),*) => { $( let _ = $arg; )* }
    }
}

macro_rules! net_trace {
    ($($arg:expr),*) => (net_log!(trace, $($arg),*));
}

macro_rules! net_debug {
    ($($arg:expr),*) => (net_log!(debug, $($arg),*));
}
