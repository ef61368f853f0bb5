//! Annotation interfaces and the annotations attached to classes and functions.

use std::fmt;

use crate::{
    file::{
        io::{push_le, write_compressed_uint},
        parser::Parser,
    },
    metadata::{
        ids::{AnnotationInterfaceId, ClassId, FunctionId, LiteralArrayId, ModuleId, StringId},
        types::TypeId,
    },
    Result,
};

/// Value of an annotation element or of a field default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 64-bit float
    Double(f64),
    /// Interned string
    String(StringId),
    /// Literal array
    LiteralArray(LiteralArrayId),
}

impl Value {
    /// Type of the value as declared by an annotation field.
    #[must_use]
    pub fn ty(self) -> TypeId {
        match self {
            Value::Bool(_) => TypeId::U1,
            Value::Double(_) => TypeId::F64,
            Value::String(_) => TypeId::String,
            Value::LiteralArray(_) => TypeId::Reference,
        }
    }

    pub(crate) fn write(self, buffer: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Bool(value) => {
                buffer.push(0);
                buffer.push(u8::from(value));
            }
            Value::Double(value) => {
                buffer.push(1);
                push_le(buffer, value);
            }
            Value::String(id) => {
                buffer.push(2);
                write_compressed_uint(id.0, buffer)?;
            }
            Value::LiteralArray(id) => {
                buffer.push(3);
                write_compressed_uint(id.0, buffer)?;
            }
        }
        Ok(())
    }

    pub(crate) fn read(parser: &mut Parser<'_>) -> Result<Value> {
        let tag = parser.read_le::<u8>()?;
        Ok(match tag {
            0 => Value::Bool(parser.read_le::<u8>()? != 0),
            1 => Value::Double(parser.read_le::<f64>()?),
            2 => Value::String(StringId::new(parser.read_compressed_uint()?)),
            3 => Value::LiteralArray(LiteralArrayId::new(parser.read_compressed_uint()?)),
            _ => return Err(malformed_error!("Unknown value tag {}", tag)),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Double(value) => write!(f, "{value:?}"),
            Value::String(id) => write!(f, "{id}"),
            Value::LiteralArray(id) => write!(f, "{id}"),
        }
    }
}

/// A field of an annotation interface.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationField {
    pub(crate) name: StringId,
    pub(crate) ty: TypeId,
    pub(crate) default: Option<Value>,
}

impl AnnotationField {
    /// Name of the field.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Default value, if declared.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        self.default
    }
}

/// Declaration of an annotation type.
#[derive(Debug, Clone)]
pub struct AnnotationInterface {
    pub(crate) name: StringId,
    pub(crate) module: ModuleId,
    pub(crate) fields: Vec<AnnotationField>,
}

impl AnnotationInterface {
    /// Name of the interface.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Declaring module.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[AnnotationField] {
        &self.fields
    }
}

/// Entity an annotation is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationOwner {
    /// A class
    Class(ClassId),
    /// A function
    Function(FunctionId),
}

/// One `name = value` pair of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationElement {
    pub(crate) name: StringId,
    pub(crate) value: Value,
}

impl AnnotationElement {
    /// Name of the element.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Value of the element.
    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }
}

/// An annotation instance.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub(crate) interface: AnnotationInterfaceId,
    pub(crate) owner: AnnotationOwner,
    pub(crate) elements: Vec<AnnotationElement>,
}

impl Annotation {
    /// Interface the annotation instantiates.
    #[must_use]
    pub fn interface(&self) -> AnnotationInterfaceId {
        self.interface
    }

    /// Annotated class or function.
    #[must_use]
    pub fn owner(&self) -> AnnotationOwner {
        self.owner
    }

    /// Elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[AnnotationElement] {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_encoding() {
        let values = [
            Value::Bool(false),
            Value::Double(-2.25),
            Value::String(StringId::new(5)),
            Value::LiteralArray(LiteralArrayId::new(1)),
        ];
        let mut buffer = Vec::new();
        for value in values {
            value.write(&mut buffer).unwrap();
        }

        let mut parser = Parser::new(&buffer);
        for value in values {
            assert_eq!(Value::read(&mut parser).unwrap(), value);
        }
        assert_eq!(Value::Double(0.0).ty(), TypeId::F64);
    }
}
