#![forbid(unsafe_code)]

use std::fmt::Write;

use crate::object::{ObjectId, ObjectKind, PassMode};
use crate::symtab::SymbolTable;

const INDENT: usize = 4;

impl SymbolTable {
    /// Text rendering of the program object tree, one object per line,
    /// nested scopes indented.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(program) = self.program() {
            self.render_object(program, 0, &mut out);
        }
        out
    }

    pub fn render_object(&self, id: ObjectId, indent: usize, out: &mut String) {
        let obj = self.object(id);
        let pad = " ".repeat(indent);
        let class = obj.class();
        let _ = match &obj.kind {
            ObjectKind::Program { .. } | ObjectKind::Procedure { .. } => {
                writeln!(out, "{pad}{class} {}", obj.name)
            }
            ObjectKind::Constant { value } => writeln!(out, "{pad}{class} {} = {value}", obj.name),
            ObjectKind::TypeAlias { actual } => writeln!(out, "{pad}{class} {} = {actual}", obj.name),
            ObjectKind::Variable { ty } => writeln!(out, "{pad}{class} {} : {ty}", obj.name),
            ObjectKind::Function { return_type, .. } => match return_type {
                Some(ty) => writeln!(out, "{pad}{class} {} : {ty}", obj.name),
                None => writeln!(out, "{pad}{class} {}", obj.name),
            },
            ObjectKind::Parameter { mode, ty, .. } => {
                let by_ref = match mode {
                    PassMode::Value => "",
                    PassMode::Reference => "VAR ",
                };
                writeln!(out, "{pad}{class} {by_ref}{} : {ty}", obj.name)
            }
        };

        if let Some(scope) = obj.owned_scope() {
            for child in &self.scope(scope).objects {
                self.render_object(*child, indent + INDENT, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kpl_lex::Loc;

    use crate::object::{Object, PassMode};
    use crate::symtab::SymbolTable;
    use crate::types::{ConstantValue, Type};

    #[test]
    fn renders_nested_routines() {
        let loc = Loc::default();
        let mut table = SymbolTable::new();
        let program = table.create_program("P", loc);
        table.enter_scope(table.object(program).owned_scope().unwrap());
        table
            .declare(Object::constant("c", ConstantValue::Char('z'), loc))
            .unwrap();
        let func = table.create_function_object("F", loc);
        let scope = func.owned_scope().unwrap();
        let id = table.declare(func).unwrap();
        table.enter_scope(scope);
        let param = table
            .create_parameter_object("n", PassMode::Reference, Type::Int, loc)
            .unwrap();
        table.declare(param).unwrap();
        table.set_return_type(id, Type::Int);
        table.exit_scope().unwrap();
        table
            .declare(Object::variable("a", Type::array(3, Type::Char), loc))
            .unwrap();

        let expected = "\
Program P
    Const c = 'z'
    Function F : integer
        Param VAR n : integer
    Var a : array[3] of char
";
        assert_eq!(table.render(), expected);
    }
}
