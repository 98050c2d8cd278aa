//! The side channel through which recoverable coercion faults are reported.

use core::fmt;

use crate::Shape;

/// Kind of the JSON token observed at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// A property name inside an object.
    Name,
    /// A string value.
    String,
    /// A number value.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`
    Null,
    /// End of input.
    EndDocument,
}

impl TokenKind {
    /// Upper-case name of the token kind, as used in fault messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::BeginObject => "BEGIN_OBJECT",
            TokenKind::EndObject => "END_OBJECT",
            TokenKind::BeginArray => "BEGIN_ARRAY",
            TokenKind::EndArray => "END_ARRAY",
            TokenKind::Name => "NAME",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Null => "NULL",
            TokenKind::EndDocument => "END_DOCUMENT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where inside its owner a fault happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultSite {
    /// The value of a struct field.
    Field,
    /// An element of a list.
    ListItem {
        /// Zero-based position of the element.
        index: usize,
    },
    /// A key or value of a map.
    MapEntry {
        /// The raw JSON key of the entry.
        key: String,
    },
}

/// A coercion fault: a JSON value that could not be converted to its target.
///
/// The target keeps its default value and decoding continues.
#[derive(Debug, Clone)]
pub struct CoercionFault {
    /// The struct or container type that owns the faulty value.
    pub owner: &'static Shape,
    /// The field that owns the value. For list items and map entries this is
    /// the field holding the container, when there is one.
    pub field: Option<&'static str>,
    /// Position inside the owner.
    pub site: FaultSite,
    /// The shape the value was supposed to coerce into.
    pub expected: &'static Shape,
    /// The token that was found instead.
    pub token: TokenKind,
    /// Reader path of the value, such as `$.tags[2]`.
    pub path: String,
}

impl fmt::Display for CoercionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot coerce {} into `{}` at {}",
            self.token, self.expected, self.path
        )?;
        match (&self.site, self.field) {
            (FaultSite::Field, Some(field)) => write!(f, " (field `{}.{field}`)", self.owner),
            (FaultSite::ListItem { index }, _) => write!(f, " (item {index} of `{}`)", self.owner),
            (FaultSite::MapEntry { key }, _) => write!(f, " (entry {key:?} of `{}`)", self.owner),
            (FaultSite::Field, None) => Ok(()),
        }
    }
}

/// Observer notified of every recoverable fault.
///
/// All methods default to doing nothing; implement the ones you care about.
/// Callbacks are invoked synchronously on the decoding thread.
pub trait FaultCallback: Send + Sync {
    /// A struct field could not be coerced.
    fn on_field_fault(&self, fault: &CoercionFault) {
        let _ = fault;
    }

    /// A list element could not be coerced.
    fn on_list_item_fault(&self, fault: &CoercionFault) {
        let _ = fault;
    }

    /// A map key or value could not be coerced.
    fn on_map_entry_fault(&self, fault: &CoercionFault) {
        let _ = fault;
    }
}

impl dyn FaultCallback + '_ {
    /// Routes a fault to the method matching its site.
    pub fn dispatch(&self, fault: &CoercionFault) {
        match fault.site {
            FaultSite::Field => self.on_field_fault(fault),
            FaultSite::ListItem { .. } => self.on_list_item_fault(fault),
            FaultSite::MapEntry { .. } => self.on_map_entry_fault(fault),
        }
    }
}

/// Discards every fault. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreFaults;

impl FaultCallback for IgnoreFaults {}

/// Emits every fault as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFaults;

impl FaultCallback for LogFaults {
    fn on_field_fault(&self, fault: &CoercionFault) {
        tracing::warn!(
            owner = %fault.owner,
            field = fault.field.unwrap_or_default(),
            token = %fault.token,
            path = %fault.path,
            "field fault: {fault}"
        );
    }

    fn on_list_item_fault(&self, fault: &CoercionFault) {
        tracing::warn!(
            owner = %fault.owner,
            token = %fault.token,
            path = %fault.path,
            "list item fault: {fault}"
        );
    }

    fn on_map_entry_fault(&self, fault: &CoercionFault) {
        tracing::warn!(
            owner = %fault.owner,
            token = %fault.token,
            path = %fault.path,
            "map entry fault: {fault}"
        );
    }
}

/// Adapts a closure into a [`FaultCallback`] receiving every fault.
pub struct FnFaultCallback<F>(pub F);

impl<F> FaultCallback for FnFaultCallback<F>
where
    F: Fn(&CoercionFault) + Send + Sync,
{
    fn on_field_fault(&self, fault: &CoercionFault) {
        (self.0)(fault)
    }

    fn on_list_item_fault(&self, fault: &CoercionFault) {
        (self.0)(fault)
    }

    fn on_map_entry_fault(&self, fault: &CoercionFault) {
        (self.0)(fault)
    }
}

impl<F> fmt::Debug for FnFaultCallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFaultCallback")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{Describe, shape_of};

    fn fault(site: FaultSite) -> CoercionFault {
        CoercionFault {
            owner: <Vec<i32>>::SHAPE,
            field: Some("tags"),
            site,
            expected: shape_of::<i32>(),
            token: TokenKind::String,
            path: "$.tags[1]".into(),
        }
    }

    #[test]
    fn dispatch_routes_by_site() {
        #[derive(Default)]
        struct Counts(Mutex<[usize; 3]>);

        impl FaultCallback for Counts {
            fn on_field_fault(&self, _: &CoercionFault) {
                self.0.lock().unwrap()[0] += 1;
            }
            fn on_list_item_fault(&self, _: &CoercionFault) {
                self.0.lock().unwrap()[1] += 1;
            }
            fn on_map_entry_fault(&self, _: &CoercionFault) {
                self.0.lock().unwrap()[2] += 1;
            }
        }

        let counts = Counts::default();
        let callback: &dyn FaultCallback = &counts;
        callback.dispatch(&fault(FaultSite::ListItem { index: 1 }));
        callback.dispatch(&fault(FaultSite::MapEntry { key: "k".into() }));
        callback.dispatch(&fault(FaultSite::ListItem { index: 2 }));
        assert_eq!(*counts.0.lock().unwrap(), [0, 2, 1]);
    }

    #[test]
    fn display_names_token_and_site() {
        let text = fault(FaultSite::ListItem { index: 1 }).to_string();
        assert_eq!(
            text,
            "cannot coerce STRING into `i32` at $.tags[1] (item 1 of `Vec<i32>`)"
        );
    }

    #[test]
    fn closure_callback_sees_all_sites() {
        let seen = Mutex::new(Vec::new());
        let callback = FnFaultCallback(|f: &CoercionFault| seen.lock().unwrap().push(f.token));
        let callback: &dyn FaultCallback = &callback;
        callback.dispatch(&fault(FaultSite::Field));
        callback.dispatch(&fault(FaultSite::MapEntry { key: "a".into() }));
        assert_eq!(*seen.lock().unwrap(), vec![TokenKind::String; 2]);
    }
}
