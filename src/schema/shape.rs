use super::tags::Tags;
use std::borrow::Cow;
use std::fmt;

/// Structural description of a schema or response type.
///
/// Rust has no runtime field introspection, so every type that takes part in
/// request parsing or document generation describes itself with this tree
/// (usually through [`Describe`]). The parser and the document generator both
/// consume the same tree, which keeps them referentially consistent.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    String,
    /// Signed integer of the given bit width, carried as `i64`
    Integer(u8),
    /// Unsigned integer of the given bit width, carried as `u64`
    Unsigned(u8),
    /// Floating point number, parsed as `f64`
    Float,
    Boolean,
    Record(RecordShape),
    Sequence(Box<TypeShape>),
    /// Optional / indirect value. Dereferenced to the pointee everywhere.
    Pointer(Box<TypeShape>),
    /// Lazily built named record, used for self-referencing types.
    Recursive(RecursiveShape),
    /// Anything the engine cannot model; documented as a bare `object`.
    Opaque,
}

/// Coarse classification of a [`TypeShape`] after pointer dereferencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Integer,
    Unsigned,
    Float,
    Boolean,
    Record,
    Sequence,
    Object,
}

impl Kind {
    /// Primitive kinds are the only ones a raw path/query string converts into.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Kind::String | Kind::Integer | Kind::Unsigned | Kind::Float | Kind::Boolean
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Integer | Kind::Unsigned | Kind::Float)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Unsigned => "unsigned integer",
            Kind::Float => "float",
            Kind::Boolean => "boolean",
            Kind::Record => "record",
            Kind::Sequence => "sequence",
            Kind::Object => "object",
        };
        write!(f, "{}", s)
    }
}

impl TypeShape {
    /// Shape of any type implementing [`Describe`].
    pub fn of<T: Describe + ?Sized>() -> Self {
        T::describe()
    }

    pub fn sequence(item: impl Into<TypeShape>) -> Self {
        TypeShape::Sequence(Box::new(item.into()))
    }

    pub fn pointer(inner: impl Into<TypeShape>) -> Self {
        TypeShape::Pointer(Box::new(inner.into()))
    }

    /// Reference a named record lazily.
    ///
    /// Use this for a field whose type (directly or indirectly) contains the
    /// type being described, e.g. a tree node holding `Vec<Node>`. `name` must
    /// be the record name `T::describe()` produces.
    pub fn recursive<T: Describe + ?Sized>(name: &'static str) -> Self {
        TypeShape::Recursive(RecursiveShape {
            name,
            build: T::describe,
        })
    }

    /// Strip pointers and expand one level of laziness.
    pub fn resolve(&self) -> Cow<'_, TypeShape> {
        match self {
            TypeShape::Pointer(inner) => inner.resolve(),
            TypeShape::Recursive(r) => match r.build() {
                TypeShape::Pointer(inner) => Cow::Owned(inner.resolve().into_owned()),
                other => Cow::Owned(other),
            },
            other => Cow::Borrowed(other),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            TypeShape::String => Kind::String,
            TypeShape::Integer(_) => Kind::Integer,
            TypeShape::Unsigned(_) => Kind::Unsigned,
            TypeShape::Float => Kind::Float,
            TypeShape::Boolean => Kind::Boolean,
            TypeShape::Record(_) | TypeShape::Recursive(_) => Kind::Record,
            TypeShape::Sequence(_) => Kind::Sequence,
            TypeShape::Pointer(inner) => inner.kind(),
            TypeShape::Opaque => Kind::Object,
        }
    }

    /// Inclusive value range of an integer shape (pointers stripped).
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            TypeShape::Pointer(inner) => inner.integer_range(),
            TypeShape::Integer(bits) => {
                let max = (1i128 << (u32::from(*bits).clamp(1, 64) - 1)) - 1;
                Some((-max - 1, max))
            }
            TypeShape::Unsigned(bits) => Some((0, (1i128 << u32::from(*bits).clamp(1, 64)) - 1)),
            _ => None,
        }
    }

    /// Whether `value` fits the width of an integer shape. Non-integer shapes
    /// admit everything.
    pub fn admits(&self, value: i128) -> bool {
        self.integer_range()
            .map(|(min, max)| (min..=max).contains(&value))
            .unwrap_or(true)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeShape::Pointer(_))
    }

    /// Element shape of a sequence (pointers stripped), `None` otherwise.
    pub fn element(&self) -> Option<&TypeShape> {
        match self {
            TypeShape::Pointer(inner) => inner.element(),
            TypeShape::Sequence(item) => Some(item),
            _ => None,
        }
    }

    /// Whether a value of this shape can be carried in a path segment or a
    /// query string: primitives and sequences of primitives only.
    pub fn is_parameter_eligible(&self) -> bool {
        let kind = self.kind();
        if kind.is_primitive() {
            return true;
        }
        kind == Kind::Sequence
            && self
                .element()
                .map(|item| item.kind().is_primitive())
                .unwrap_or(false)
    }
}

impl From<RecordShape> for TypeShape {
    fn from(record: RecordShape) -> Self {
        TypeShape::Record(record)
    }
}

/// A named record built on demand.
#[derive(Clone, Copy)]
pub struct RecursiveShape {
    pub name: &'static str,
    build: fn() -> TypeShape,
}

impl RecursiveShape {
    pub fn build(&self) -> TypeShape {
        (self.build)()
    }
}

impl fmt::Debug for RecursiveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecursiveShape")
            .field("name", &self.name)
            .finish()
    }
}

// Two lazy references are the same shape when they name the same record.
impl PartialEq for RecursiveShape {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// An ordered list of fields, optionally carrying a type name.
///
/// Records without a name are "anonymous"; the document generator derives a
/// name for them from the enclosing record and field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordShape {
    pub name: Option<String>,
    pub fields: Vec<FieldShape>,
}

impl RecordShape {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// Whether any field carries a required marker in any tag.
    pub fn has_required_fields(&self) -> bool {
        self.fields.iter().any(|f| f.tags.is_required())
    }
}

/// One field of a [`RecordShape`]: declared name, shape and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub name: String,
    pub shape: TypeShape,
    pub tags: Tags,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, shape: impl Into<TypeShape>) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
            tags: Tags::default(),
        }
    }

    /// Field whose shape comes from a [`Describe`] implementation.
    pub fn of<T: Describe + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, T::describe())
    }

    /// Attach a tag, e.g. `.tag("validate", "required,min=1")`.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }

    pub fn json(self, value: impl Into<String>) -> Self {
        self.tag("json", value)
    }

    pub fn validate(self, value: impl Into<String>) -> Self {
        self.tag("validate", value)
    }

    pub fn default_value(self, value: impl Into<String>) -> Self {
        self.tag("default", value)
    }

    /// Serialized name of the field in bodies, instances and documents.
    pub fn json_name(&self) -> String {
        self.tags.json_name(&self.name)
    }
}

/// Types that can describe their own shape.
///
/// Implemented for primitives, `Vec`, `Option`, `Box` and `serde_json::Value`;
/// records implement it by hand with [`RecordShape`]:
///
/// ```rust
/// use routeschema::schema::{Describe, FieldShape, RecordShape, TypeShape};
///
/// struct Pet;
///
/// impl Describe for Pet {
///     fn describe() -> TypeShape {
///         RecordShape::named("Pet")
///             .field(FieldShape::of::<String>("Name").validate("required,min=1"))
///             .field(FieldShape::of::<Option<u32>>("Age"))
///             .into()
///     }
/// }
/// ```
pub trait Describe {
    fn describe() -> TypeShape;
}

macro_rules! describe_as {
    ($shape:expr => $($t:ty),+) => {
        $(impl Describe for $t {
            fn describe() -> TypeShape {
                $shape
            }
        })+
    };
}

describe_as!(TypeShape::String => String, str, char);
describe_as!(TypeShape::Integer(8) => i8);
describe_as!(TypeShape::Integer(16) => i16);
describe_as!(TypeShape::Integer(32) => i32);
describe_as!(TypeShape::Integer(64) => i64);
describe_as!(TypeShape::Integer(isize::BITS as u8) => isize);
describe_as!(TypeShape::Unsigned(8) => u8);
describe_as!(TypeShape::Unsigned(16) => u16);
describe_as!(TypeShape::Unsigned(32) => u32);
describe_as!(TypeShape::Unsigned(64) => u64);
describe_as!(TypeShape::Unsigned(usize::BITS as u8) => usize);
describe_as!(TypeShape::Float => f32, f64);
describe_as!(TypeShape::Boolean => bool);
describe_as!(TypeShape::Opaque => serde_json::Value);

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeShape {
        TypeShape::sequence(T::describe())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeShape {
        TypeShape::pointer(T::describe())
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe() -> TypeShape {
        TypeShape::pointer(T::describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Describe for Node {
        fn describe() -> TypeShape {
            RecordShape::named("Node")
                .field(FieldShape::of::<String>("Label"))
                .field(FieldShape::new(
                    "Children",
                    TypeShape::sequence(TypeShape::recursive::<Node>("Node")),
                ))
                .into()
        }
    }

    #[test]
    fn test_pointer_is_dereferenced_for_kind() {
        let shape = TypeShape::of::<Option<Box<i32>>>();
        assert_eq!(shape.kind(), Kind::Integer);
        assert!(shape.is_pointer());
        assert_eq!(*shape.resolve(), TypeShape::Integer(32));
    }

    #[test]
    fn test_integer_width_bounds() {
        assert_eq!(TypeShape::of::<u8>().integer_range(), Some((0, 255)));
        assert_eq!(TypeShape::of::<Option<i8>>().integer_range(), Some((-128, 127)));
        assert_eq!(
            TypeShape::of::<u64>().integer_range(),
            Some((0, i128::from(u64::MAX)))
        );
        assert!(TypeShape::of::<u8>().admits(255));
        assert!(!TypeShape::of::<u8>().admits(300));
        assert!(!TypeShape::of::<i16>().admits(-40_000));
        assert!(TypeShape::Float.admits(1e9 as i128));
        assert_eq!(TypeShape::String.integer_range(), None);
    }

    #[test]
    fn test_parameter_eligibility() {
        assert!(TypeShape::of::<u16>().is_parameter_eligible());
        assert!(TypeShape::of::<Vec<String>>().is_parameter_eligible());
        assert!(TypeShape::of::<Option<bool>>().is_parameter_eligible());
        assert!(!TypeShape::of::<Node>().is_parameter_eligible());
        assert!(!TypeShape::of::<Vec<Node>>().is_parameter_eligible());
        assert!(!TypeShape::Opaque.is_parameter_eligible());
    }

    #[test]
    fn test_recursive_shape_resolves_lazily() {
        let shape = TypeShape::of::<Node>();
        let TypeShape::Record(record) = &shape else {
            panic!("expected record");
        };
        let children = record.fields[1].shape.element().expect("sequence");
        assert_eq!(children.kind(), Kind::Record);
        match &*children.resolve() {
            TypeShape::Record(r) => assert_eq!(r.name.as_deref(), Some("Node")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
