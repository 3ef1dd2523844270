#![forbid(unsafe_code)]

use kpl_lex::Loc;
use miette::Diagnostic;
use thiserror::Error;

use crate::object::{Object, ObjectId, ObjectKind, PassMode, ScopeId};
use crate::types::Type;

/// Misuse of the scope discipline by the caller. These are bugs in the
/// driver, never problems with the program being compiled.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum SymbolTableError {
    #[error("symbol table: no current scope")]
    #[diagnostic(code(kpl::symtab))]
    NoCurrentScope,
    #[error("symbol table: current scope is not owned by a routine")]
    #[diagnostic(code(kpl::symtab))]
    NoEnclosingRoutine,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scope {
    /// Program, function or procedure that introduces the scope.
    pub owner: Option<ObjectId>,
    /// Lexically enclosing scope.
    pub outer: Option<ScopeId>,
    /// Declared objects, in declaration order.
    pub objects: Vec<ObjectId>,
}

/// Arena of every object and scope of one compilation.
///
/// Back references (`owner`, `outer`, a parameter's routine) are handles into
/// the arena, so a routine's parameter list and its scope's object list are
/// two views over the same ids. Dropping the table releases everything.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    objects: Vec<Object>,
    scopes: Vec<Scope>,
    current: Option<ScopeId>,
    globals: Vec<ObjectId>,
    program: Option<ObjectId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table with the builtin routines already declared.
    pub fn new() -> Self {
        let mut table = Self {
            objects: Vec::new(),
            scopes: Vec::new(),
            current: None,
            globals: Vec::new(),
            program: None,
        };
        table.install_builtins();
        table
    }

    fn install_builtins(&mut self) {
        self.builtin_function("READC", Type::Char);
        self.builtin_function("READI", Type::Int);
        self.builtin_procedure("WRITEI", &[("i", Type::Int)]);
        self.builtin_procedure("WRITEC", &[("ch", Type::Char)]);
        self.builtin_procedure("WRITELN", &[]);
    }

    fn builtin_function(&mut self, name: &str, return_type: Type) {
        let scope = self.create_scope(None, None);
        let id = self.alloc(Object::new(
            name,
            None,
            ObjectKind::Function {
                params: Vec::new(),
                return_type: Some(return_type),
                scope,
            },
        ));
        self.scopes[scope.0].owner = Some(id);
        self.globals.push(id);
    }

    fn builtin_procedure(&mut self, name: &str, params: &[(&str, Type)]) {
        let scope = self.create_scope(None, None);
        let id = self.alloc(Object::new(
            name,
            None,
            ObjectKind::Procedure {
                params: Vec::new(),
                scope,
            },
        ));
        self.scopes[scope.0].owner = Some(id);
        for (param, ty) in params {
            let obj = Object::new(
                *param,
                None,
                ObjectKind::Parameter {
                    mode: PassMode::Value,
                    ty: ty.clone(),
                    routine: id,
                },
            );
            self.declare_into(scope, obj);
        }
        self.globals.push(id);
    }

    fn alloc(&mut self, obj: Object) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(obj);
        id
    }

    pub fn create_scope(&mut self, owner: Option<ObjectId>, outer: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            owner,
            outer,
            objects: Vec::new(),
        });
        id
    }

    /// Creates the root program object and its top scope. The program is not
    /// declared in any scope.
    pub fn create_program(&mut self, name: &str, loc: Loc) -> ObjectId {
        let scope = self.create_scope(None, None);
        let id = self.alloc(Object::new(name, Some(loc), ObjectKind::Program { scope }));
        self.scopes[scope.0].owner = Some(id);
        self.program = Some(id);
        id
    }

    /// A function whose scope nests inside the current one. The scope's owner
    /// is bound when the object is declared.
    pub fn create_function_object(&mut self, name: &str, loc: Loc) -> Object {
        let scope = self.create_scope(None, self.current);
        Object::new(
            name,
            Some(loc),
            ObjectKind::Function {
                params: Vec::new(),
                return_type: None,
                scope,
            },
        )
    }

    pub fn create_procedure_object(&mut self, name: &str, loc: Loc) -> Object {
        let scope = self.create_scope(None, self.current);
        Object::new(
            name,
            Some(loc),
            ObjectKind::Procedure {
                params: Vec::new(),
                scope,
            },
        )
    }

    /// A parameter of the routine owning the current scope.
    pub fn create_parameter_object(
        &self,
        name: &str,
        mode: PassMode,
        ty: Type,
        loc: Loc,
    ) -> Result<Object, SymbolTableError> {
        let routine = self
            .current_owner()
            .filter(|id| self.is_routine(*id))
            .ok_or(SymbolTableError::NoEnclosingRoutine)?;
        Ok(Object::new(
            name,
            Some(loc),
            ObjectKind::Parameter { mode, ty, routine },
        ))
    }

    fn is_routine(&self, id: ObjectId) -> bool {
        matches!(
            self.object(id).kind,
            ObjectKind::Function { .. } | ObjectKind::Procedure { .. }
        )
    }

    pub fn enter_scope(&mut self, scope: ScopeId) {
        tracing::debug!(scope = scope.0, owner = ?self.owner_name(scope), "enter scope");
        self.current = Some(scope);
    }

    pub fn exit_scope(&mut self) -> Result<(), SymbolTableError> {
        let scope = self.current.ok_or(SymbolTableError::NoCurrentScope)?;
        tracing::debug!(scope = scope.0, owner = ?self.owner_name(scope), "exit scope");
        self.current = self.scopes[scope.0].outer;
        Ok(())
    }

    /// Appends `obj` to the current scope. Parameters are also appended to
    /// their routine's parameter list; routines become owners of their scope.
    ///
    /// Freshness is not checked here; see [`SymbolTable::check_fresh_ident`].
    pub fn declare(&mut self, obj: Object) -> Result<ObjectId, SymbolTableError> {
        let scope = self.current.ok_or(SymbolTableError::NoCurrentScope)?;
        tracing::debug!(name = %obj.name, class = %obj.class(), scope = scope.0, "declare");
        Ok(self.declare_into(scope, obj))
    }

    fn declare_into(&mut self, scope: ScopeId, obj: Object) -> ObjectId {
        let routine = match &obj.kind {
            ObjectKind::Parameter { routine, .. } => Some(*routine),
            _ => None,
        };
        let owned = obj.owned_scope();

        let id = self.alloc(obj);
        self.scopes[scope.0].objects.push(id);

        if let Some(routine) = routine {
            match &mut self.objects[routine.0].kind {
                ObjectKind::Function { params, .. } | ObjectKind::Procedure { params, .. } => {
                    params.push(id)
                }
                _ => {}
            }
        }
        if let Some(owned) = owned {
            self.scopes[owned.0].owner = Some(id);
        }
        id
    }

    /// Records a function's return type once its header has been parsed.
    pub fn set_return_type(&mut self, function: ObjectId, ty: Type) {
        if let ObjectKind::Function { return_type, .. } = &mut self.objects[function.0].kind {
            *return_type = Some(ty);
        }
    }

    /// Nearest binding of `name`: the current scope, then each enclosing
    /// scope, then the builtins.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        let mut scope = self.current;
        while let Some(id) = scope {
            if let Some(found) = self.find_in_scope(id, name) {
                return Some(found);
            }
            scope = self.scopes[id.0].outer;
        }
        self.globals
            .iter()
            .copied()
            .find(|id| self.objects[id.0].name == name)
    }

    /// Binding of `name` in the current scope only.
    pub fn lookup_in_current(&self, name: &str) -> Option<ObjectId> {
        self.current.and_then(|scope| self.find_in_scope(scope, name))
    }

    fn find_in_scope(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        self.scopes[scope.0]
            .objects
            .iter()
            .copied()
            .find(|id| self.objects[id.0].name == name)
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.current
    }

    pub fn current_owner(&self) -> Option<ObjectId> {
        self.current.and_then(|scope| self.scopes[scope.0].owner)
    }

    pub fn program(&self) -> Option<ObjectId> {
        self.program
    }

    /// Objects declared in `scope`, in declaration order.
    pub fn scope_objects(&self, scope: ScopeId) -> impl Iterator<Item = &Object> + '_ {
        self.scopes[scope.0]
            .objects
            .iter()
            .map(|id| &self.objects[id.0])
    }

    pub fn params(&self, routine: ObjectId) -> impl Iterator<Item = &Object> + '_ {
        self.objects[routine.0]
            .params()
            .iter()
            .map(|id| &self.objects[id.0])
    }

    fn owner_name(&self, scope: ScopeId) -> Option<&str> {
        self.scopes[scope.0]
            .owner
            .map(|id| self.objects[id.0].name.as_str())
    }
}
