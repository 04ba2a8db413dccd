use crate::error::SemanticError;
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum DataType {
    Int,
    Float,
    Str,
    Char,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Str => write!(f, "string"),
            DataType::Char => write!(f, "char"),
        }
    }
}

/// Concrete compile-time value of a symbol or expression.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    /// The type a value has on its own, regardless of any declared type
    /// stamped over it.
    pub const fn ty(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Str(_) => DataType::Str,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(num) => write!(f, "{num}"),
            Value::Str(text) => write!(f, "{text}"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: DataType,
    /// `None` until the variable is initialized or assigned.
    pub value: Option<Value>,
}

impl Symbol {
    pub fn new(name: &str, ty: DataType, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
        }
    }
}

/// Flat namespace shared by the whole program. Blocks do not open scopes
/// and entries are never removed.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    table: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        symbol: Symbol,
        line: usize,
    ) -> Result<(), SemanticError> {
        if self.is_declared(&symbol.name) {
            return Err(SemanticError::DuplicateDeclaration {
                name: symbol.name,
                line,
            });
        }
        trace!(name = %symbol.name, ty = %symbol.ty, "declare symbol");
        self.table.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn update(
        &mut self,
        symbol: Symbol,
        line: usize,
    ) -> Result<(), SemanticError> {
        match self.table.get_mut(&symbol.name) {
            Some(entry) => {
                trace!(name = %symbol.name, value = ?symbol.value, "update symbol");
                *entry = symbol;
                Ok(())
            }
            None => Err(SemanticError::UndeclaredVariable {
                name: symbol.name,
                line,
            }),
        }
    }

    pub fn lookup(
        &self,
        name: &str,
        line: usize,
    ) -> Result<&Symbol, SemanticError> {
        self.table
            .get(name)
            .ok_or_else(|| SemanticError::UndeclaredVariable {
                name: name.into(),
                line,
            })
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Symbols in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.table.values()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for symbol in self.iter() {
            write!(f, "{}\t{}\t", symbol.ty, symbol.name)?;
            if let Some(value) = &symbol.value {
                write!(f, "{value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_symbol_table {
    use super::*;

    #[test]
    fn redeclaration_fails() {
        let mut table = SymbolTable::new();
        table
            .declare(Symbol::new("a", DataType::Int, None), 0)
            .unwrap();
        assert_eq!(
            table.declare(
                Symbol::new("a", DataType::Str, Some(Value::Str("x".into()))),
                3
            ),
            Err(SemanticError::DuplicateDeclaration {
                name: "a".into(),
                line: 3
            })
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn update_and_lookup_require_declaration() {
        let mut table = SymbolTable::new();
        assert!(matches!(
            table.lookup("ghost", 1),
            Err(SemanticError::UndeclaredVariable { .. })
        ));
        assert!(matches!(
            table.update(Symbol::new("ghost", DataType::Int, None), 1),
            Err(SemanticError::UndeclaredVariable { .. })
        ));
        assert!(!table.is_declared("ghost"));
    }

    #[test]
    fn update_replaces_value() {
        let mut table = SymbolTable::new();
        table
            .declare(Symbol::new("n", DataType::Int, None), 0)
            .unwrap();
        table
            .update(Symbol::new("n", DataType::Int, Some(Value::Int(7))), 1)
            .unwrap();
        assert_eq!(table.lookup("n", 2).unwrap().value, Some(Value::Int(7)));
    }

    #[test]
    fn display_in_name_order() {
        let mut table = SymbolTable::new();
        table
            .declare(
                Symbol::new("b", DataType::Str, Some(Value::Str("hi".into()))),
                0,
            )
            .unwrap();
        table
            .declare(Symbol::new("a", DataType::Int, None), 0)
            .unwrap();
        assert_eq!(table.to_string(), "int\ta\t\nstring\tb\thi\n");
    }
}
