//! Compilation context: builtin type table and front-end settings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::{NumberKind, Type, TypeKind};

/// Front-end options that change how expressions are lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSettings {
    /// Permits implicit float-to-int conversions (runtime effects enable this).
    pub allow_narrowing_conversions: bool,
}

/// Builtin types shared by every program.
#[derive(Debug, Clone)]
pub struct BuiltinTypes {
    pub invalid: Arc<Type>,
    pub void: Arc<Type>,
    pub bool: Arc<Type>,
    pub int: Arc<Type>,
    pub uint: Arc<Type>,
    pub float: Arc<Type>,
    pub half: Arc<Type>,
    pub sampler2d: Arc<Type>,

    float_vectors: [Arc<Type>; 3],
    half_vectors: [Arc<Type>; 3],
    int_vectors: [Arc<Type>; 3],
    bool_vectors: [Arc<Type>; 3],
    /// Indexed by `[columns - 2][rows - 2]`.
    float_matrices: [[Arc<Type>; 3]; 3],
    half_matrices: [[Arc<Type>; 3]; 3],
}

fn scalar(name: &str, kind: NumberKind) -> Arc<Type> {
    Arc::new(Type::new(name, TypeKind::Scalar(kind)))
}

fn vectors(component: &Arc<Type>) -> [Arc<Type>; 3] {
    [2u8, 3, 4].map(|columns| {
        Arc::new(Type::new(
            format!("{}{columns}", component.name()),
            TypeKind::Vector {
                component: Arc::clone(component),
                columns,
            },
        ))
    })
}

fn matrices(component: &Arc<Type>) -> [[Arc<Type>; 3]; 3] {
    [2u8, 3, 4].map(|columns| {
        [2u8, 3, 4].map(|rows| {
            Arc::new(Type::new(
                format!("{}{columns}x{rows}", component.name()),
                TypeKind::Matrix {
                    component: Arc::clone(component),
                    columns,
                    rows,
                },
            ))
        })
    })
}

impl Default for BuiltinTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinTypes {
    #[must_use]
    pub fn new() -> Self {
        let bool = scalar("bool", NumberKind::Boolean);
        let int = scalar("int", NumberKind::Signed);
        let uint = scalar("uint", NumberKind::Unsigned);
        let float = scalar("float", NumberKind::Float);
        let half = scalar("half", NumberKind::Float);

        Self {
            invalid: Arc::new(Type::new("<INVALID>", TypeKind::Invalid)),
            void: Arc::new(Type::new("void", TypeKind::Void)),
            sampler2d: Arc::new(Type::new("sampler2D", TypeKind::Sampler)),
            float_vectors: vectors(&float),
            half_vectors: vectors(&half),
            int_vectors: vectors(&int),
            bool_vectors: vectors(&bool),
            float_matrices: matrices(&float),
            half_matrices: matrices(&half),
            bool,
            int,
            uint,
            float,
            half,
        }
    }

    /// `component{columns}` for float, half, int and bool components.
    #[must_use]
    pub fn vector(&self, component: &Type, columns: u8) -> Option<Arc<Type>> {
        if !(2..=4).contains(&columns) {
            return None;
        }
        let table = if *component == *self.float {
            &self.float_vectors
        } else if *component == *self.half {
            &self.half_vectors
        } else if *component == *self.int {
            &self.int_vectors
        } else if *component == *self.bool {
            &self.bool_vectors
        } else {
            return None;
        };
        Some(Arc::clone(&table[usize::from(columns - 2)]))
    }

    /// `component{columns}x{rows}` for float and half components.
    #[must_use]
    pub fn matrix(&self, component: &Type, columns: u8, rows: u8) -> Option<Arc<Type>> {
        if !(2..=4).contains(&columns) || !(2..=4).contains(&rows) {
            return None;
        }
        let table = if *component == *self.float {
            &self.float_matrices
        } else if *component == *self.half {
            &self.half_matrices
        } else {
            return None;
        };
        Some(Arc::clone(
            &table[usize::from(columns - 2)][usize::from(rows - 2)],
        ))
    }

    /// Looks up a builtin type by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Arc<Type>> {
        let scalars = [
            &self.void,
            &self.bool,
            &self.int,
            &self.uint,
            &self.float,
            &self.half,
            &self.sampler2d,
        ];
        scalars
            .into_iter()
            .chain(self.float_vectors.iter())
            .chain(self.half_vectors.iter())
            .chain(self.int_vectors.iter())
            .chain(self.bool_vectors.iter())
            .chain(self.float_matrices.iter().flatten())
            .chain(self.half_matrices.iter().flatten())
            .find(|ty| ty.name() == name)
            .cloned()
    }
}

/// Everything index resolution needs besides the symbol table.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub types: BuiltinTypes,
    pub settings: ProgramSettings,
}

impl Context {
    #[must_use]
    pub fn new(settings: ProgramSettings) -> Self {
        Self {
            types: BuiltinTypes::new(),
            settings,
        }
    }
}
