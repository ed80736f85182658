//! Event variants and the shapes subscribers key on.
//!
//! Every dispatched value is an [`Event`]. Its [`Shape`] is the dispatch key;
//! interface shapes (`Pointer`, `Input`, `Any`) are satisfied by several
//! concrete shapes through a static table rather than runtime inspection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bus::registry::BusError;
use crate::routing::{Location, RouteOutcome};

/// Dispatch key declared by a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Navigate,
    Route,
    Click,
    Key,
    ViewUpdate,
    Scoped,
    Custom,
    /// Interface: pointer input (`Click`).
    Pointer,
    /// Interface: any user input (`Click`, `Key`).
    Input,
    /// Interface: every event.
    Any,
}

impl Shape {
    /// Every shape, in declaration order.
    pub const ALL: [Shape; 10] = [
        Shape::Navigate,
        Shape::Route,
        Shape::Click,
        Shape::Key,
        Shape::ViewUpdate,
        Shape::Scoped,
        Shape::Custom,
        Shape::Pointer,
        Shape::Input,
        Shape::Any,
    ];

    /// Shapes a value of this concrete shape satisfies, itself first.
    pub fn satisfies(self) -> &'static [Shape] {
        match self {
            Shape::Navigate => &[Shape::Navigate, Shape::Any],
            Shape::Route => &[Shape::Route, Shape::Any],
            Shape::Click => &[Shape::Click, Shape::Pointer, Shape::Input, Shape::Any],
            Shape::Key => &[Shape::Key, Shape::Input, Shape::Any],
            Shape::ViewUpdate => &[Shape::ViewUpdate, Shape::Any],
            Shape::Scoped => &[Shape::Scoped, Shape::Any],
            Shape::Custom => &[Shape::Custom, Shape::Any],
            Shape::Pointer => &[Shape::Pointer],
            Shape::Input => &[Shape::Input],
            Shape::Any => &[Shape::Any],
        }
    }

    /// True for shapes no event carries directly.
    pub fn is_interface(self) -> bool {
        matches!(self, Shape::Pointer | Shape::Input | Shape::Any)
    }

    /// Stable lowercase name, used in config and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Navigate => "navigate",
            Shape::Route => "route",
            Shape::Click => "click",
            Shape::Key => "key",
            Shape::ViewUpdate => "view_update",
            Shape::Scoped => "scoped",
            Shape::Custom => "custom",
            Shape::Pointer => "pointer",
            Shape::Input => "input",
            Shape::Any => "any",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| BusError::UnknownShape(s.to_string()))
    }
}

/// Pointer click at view coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    pub x: i32,
    pub y: i32,
}

/// Keyboard input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

/// Request for a view to re-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewUpdate {
    pub view_id: String,
}

/// Envelope addressed to one scope's subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoped {
    pub owner_id: String,
    pub payload: Box<Event>,
}

/// Application-defined event with a free-form payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Custom {
    pub name: String,
    pub payload: serde_json::Value,
}

/// A dispatchable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    Navigate(Location),
    Route(RouteOutcome),
    Click(Click),
    Key(Key),
    ViewUpdate(ViewUpdate),
    Scoped(Scoped),
    Custom(Custom),
}

impl Event {
    /// Concrete shape of this value.
    pub fn shape(&self) -> Shape {
        match self {
            Event::Navigate(_) => Shape::Navigate,
            Event::Route(_) => Shape::Route,
            Event::Click(_) => Shape::Click,
            Event::Key(_) => Shape::Key,
            Event::ViewUpdate(_) => Shape::ViewUpdate,
            Event::Scoped(_) => Shape::Scoped,
            Event::Custom(_) => Shape::Custom,
        }
    }

    /// Whether a subscriber keyed on `shape` receives this value.
    pub fn satisfies(&self, shape: Shape) -> bool {
        self.shape().satisfies().contains(&shape)
    }

    /// Wrap `payload` for delivery to the scope owned by `owner_id`.
    pub fn scoped(owner_id: impl Into<String>, payload: Event) -> Self {
        Event::Scoped(Scoped {
            owner_id: owner_id.into(),
            payload: Box::new(payload),
        })
    }

    /// Build a custom event.
    pub fn custom(name: impl Into<String>, payload: impl Into<serde_json::Value>) -> Self {
        Event::Custom(Custom {
            name: name.into(),
            payload: payload.into(),
        })
    }
}

/// A concrete event type a handler can subscribe to directly.
pub trait Payload: Sized + 'static {
    /// Shape the subscription is keyed on.
    const SHAPE: Shape;

    /// Borrow the payload out of a matching event.
    fn extract(event: &Event) -> Option<&Self>;
}

macro_rules! impl_payload {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Payload for $ty {
                const SHAPE: Shape = Shape::$variant;

                fn extract(event: &Event) -> Option<&Self> {
                    match event {
                        Event::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Event {
                fn from(value: $ty) -> Self {
                    Event::$variant(value)
                }
            }
        )*
    };
}

impl_payload! {
    Location => Navigate,
    RouteOutcome => Route,
    Click => Click,
    Key => Key,
    ViewUpdate => ViewUpdate,
    Scoped => Scoped,
    Custom => Custom,
}
