//! SQL generation for table models
//!
//! Every statement is derived from the ordered field list of a [`Table`].
//! Parameter markers are assigned by a single allocation pass per statement,
//! so a field that appears twice in one statement (the insert list and the
//! `DO UPDATE SET` list of an upsert) uses the same `$n` in both places.

use crate::errors::GenerateError;
use crate::field::{Field, VALUE};
use crate::table::Table;
use type_mapping::to_sql_literal;

/// Statement kinds a table model generates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetById,
    DeleteById,
    Insert,
    Update,
    Upsert,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetById => "get_by_id",
            Operation::DeleteById => "delete_by_id",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
        }
    }

    /// Whether the statement references the field through a parameter
    fn references(&self, field: &Field) -> bool {
        match self {
            Operation::GetById | Operation::DeleteById => field.identity,
            Operation::Insert => !field.insert.is_empty(),
            // the identity predicate always reads the identity parameters
            Operation::Update => field.identity || !field.update.is_empty(),
            Operation::Upsert => !field.insert.is_empty() || !field.update.is_empty(),
        }
    }

    fn allocates(&self, field: &Field) -> bool {
        match self {
            Operation::GetById | Operation::DeleteById => field.identity,
            Operation::Update if field.identity => true,
            _ => field.binds() && self.references(field),
        }
    }
}

/// Positional parameter index per field (1-based), `None` when the field
/// takes no parameter in `op`.
///
/// Update numbers its identity fields first, in declaration order, so the
/// `WHERE` predicate reads `$1..$k` wherever the key columns are declared.
/// Every other statement numbers fields in declaration order.
pub(crate) fn allocate(fields: &[Field], op: Operation) -> Vec<Option<usize>> {
    let leading = |field: &Field| op == Operation::Update && field.identity;
    let mut slots = vec![None; fields.len()];
    let mut count = 0;
    for pass in [true, false] {
        for (slot, field) in slots.iter_mut().zip(fields) {
            if leading(field) == pass && op.allocates(field) {
                count += 1;
                *slot = Some(count);
            }
        }
    }
    slots
}

impl<T> Table<T> {
    /// Every field qualified by table name, comma-joined
    pub fn generate_select_fields(&self) -> String {
        let mut b = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                b.push(',');
            }
            b.push_str(&self.name);
            b.push('.');
            b.push_str(&field.name);
        }
        b
    }

    /// Every field aliased as `"<table>.<name>"`, optionally wrapped in
    /// `COALESCE` with the field's null default.
    ///
    /// Meant to feed the `select_additional_columns` of another table that
    /// joins this one, so its columns decode under a prefixed name.
    pub fn additional_columns(&self, coalesce: bool) -> String {
        let mut b = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                b.push(',');
            }
            if coalesce {
                b.push_str("COALESCE(");
            }
            b.push_str(&self.name);
            b.push('.');
            b.push_str(&field.name);
            if coalesce {
                b.push(',');
                match &field.null_default {
                    Some(default) => b.push_str(&to_sql_literal(default)),
                    None => b.push_str("NULL"),
                }
                b.push(')');
            }
            b.push_str(" AS \"");
            b.push_str(self.name.trim_matches('"'));
            b.push('.');
            b.push_str(field.bare_name());
            b.push('"');
        }
        b
    }

    pub fn generate_get_by_id_query(&self) -> String {
        let mut b = String::from("SELECT ");
        self.write_projection(&mut b);
        b.push_str(" FROM ");
        self.write_qualified_name(&mut b);
        self.write_joins(&mut b);
        b.push_str(" WHERE ");
        self.write_identity_predicate(&mut b);
        b
    }

    /// Select one row matching the given columns, `$1..$n` in the order given
    pub fn generate_get_by_fields_query(&self, columns: &[&str]) -> String {
        let mut b = String::from("SELECT ");
        self.write_projection(&mut b);
        b.push_str(" FROM ");
        self.write_qualified_name(&mut b);
        self.write_joins(&mut b);
        b.push_str(" WHERE ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                b.push_str(" AND ");
            }
            b.push_str(&self.name);
            b.push('.');
            b.push_str(column);
            b.push_str(" = $");
            b.push_str(&(i + 1).to_string());
        }
        b
    }

    pub fn generate_delete_by_id_query(&self) -> String {
        let mut b = String::from("DELETE FROM ");
        self.write_qualified_name(&mut b);
        b.push_str(" WHERE ");
        self.write_identity_predicate(&mut b);
        b
    }

    pub fn generate_insert_query(&self) -> Result<String, GenerateError> {
        let slots = allocate(&self.fields, Operation::Insert);
        let mut names = Vec::new();
        let mut inserts = Vec::new();

        for (field, slot) in self.fields.iter().zip(&slots) {
            if !field.insert.is_empty() {
                names.push(field.name.as_str());
                inserts.push(self.render(field, &field.insert, *slot)?);
            }
        }

        let mut b = String::from("WITH ");
        b.push_str(&self.name);
        b.push_str(" AS (INSERT INTO ");
        self.write_qualified_name(&mut b);
        Self::write_insert_lists(&mut b, &names, &inserts);
        b.push_str(" RETURNING *) SELECT ");
        self.write_projection(&mut b);
        b.push_str(" FROM ");
        b.push_str(&self.name);
        self.write_joins(&mut b);
        Ok(b)
    }

    pub fn generate_update_query(&self) -> Result<String, GenerateError> {
        let slots = allocate(&self.fields, Operation::Update);
        let mut updates = Vec::new();
        for (field, slot) in self.fields.iter().zip(&slots) {
            if !field.update.is_empty() {
                updates.push(self.render_assignment(field, *slot)?);
            }
        }
        if updates.is_empty() {
            return Err(GenerateError::NoUpdateColumns {
                table: self.name.clone(),
            });
        }

        let mut b = String::from("WITH ");
        b.push_str(&self.name);
        b.push_str(" AS (UPDATE ");
        self.write_qualified_name(&mut b);
        b.push_str(" SET ");
        b.push_str(&updates.join(","));
        b.push_str(" WHERE ");
        self.write_identity_predicate(&mut b);
        b.push_str(" RETURNING *) SELECT ");
        self.write_projection(&mut b);
        b.push_str(" FROM ");
        b.push_str(&self.name);
        self.write_joins(&mut b);
        Ok(b)
    }

    pub fn generate_upsert_query(&self) -> Result<String, GenerateError> {
        let slots = allocate(&self.fields, Operation::Upsert);
        let mut names = Vec::new();
        let mut inserts = Vec::new();
        let mut updates = Vec::new();
        let mut ids = Vec::new();

        for (field, slot) in self.fields.iter().zip(&slots) {
            if !field.insert.is_empty() {
                names.push(field.name.as_str());
                inserts.push(self.render(field, &field.insert, *slot)?);
            }
            if !field.update.is_empty() {
                updates.push(self.render_assignment(field, *slot)?);
            }
            if field.identity {
                ids.push(field.name.as_str());
            }
        }
        if updates.is_empty() {
            return Err(GenerateError::NoUpdateColumns {
                table: self.name.clone(),
            });
        }

        let mut b = String::from("WITH ");
        b.push_str(&self.name);
        b.push_str(" AS (INSERT INTO ");
        self.write_qualified_name(&mut b);
        Self::write_insert_lists(&mut b, &names, &inserts);
        b.push_str(" ON CONFLICT (");
        b.push_str(&ids.join(","));
        b.push_str(") DO UPDATE SET ");
        b.push_str(&updates.join(","));
        b.push_str(" RETURNING *) SELECT ");
        self.write_projection(&mut b);
        b.push_str(" FROM ");
        b.push_str(&self.name);
        self.write_joins(&mut b);
        Ok(b)
    }

    /// Whether any field has an update template
    pub(crate) fn has_update_columns(&self) -> bool {
        self.fields.iter().any(|f| !f.update.is_empty())
    }

    /// Base query for the embedded selector
    pub fn generate_selector_query(&self) -> String {
        let mut b = String::from("SELECT ");
        self.write_projection(&mut b);
        b.push_str(" FROM ");
        self.write_qualified_name(&mut b);
        self.write_joins(&mut b);
        b
    }

    /// Substitute the field's parameter marker into a template
    fn render(&self, field: &Field, template: &str, slot: Option<usize>) -> Result<String, GenerateError> {
        match slot {
            Some(index) => Ok(template.replace(VALUE, &format!("${}", index))),
            None if template.contains(VALUE) => Err(GenerateError::UnboundPlaceholder {
                table: self.name.clone(),
                field: field.name.clone(),
            }),
            None => Ok(template.to_string()),
        }
    }

    fn render_assignment(&self, field: &Field, slot: Option<usize>) -> Result<String, GenerateError> {
        let value = self.render(field, &field.update, slot)?;
        Ok(format!("{} = {}", field.name, value))
    }

    fn write_insert_lists(b: &mut String, names: &[&str], inserts: &[String]) {
        if names.is_empty() {
            b.push_str(" DEFAULT VALUES");
            return;
        }
        b.push_str(" (");
        b.push_str(&names.join(","));
        b.push_str(") VALUES(");
        b.push_str(&inserts.join(","));
        b.push(')');
    }

    fn write_projection(&self, b: &mut String) {
        b.push_str(&self.select_columns);
        if !self.select_additional_columns.is_empty() {
            if !self.select_columns.is_empty() {
                b.push(',');
            }
            b.push_str(&self.select_additional_columns);
        }
    }

    fn write_qualified_name(&self, b: &mut String) {
        if !self.schema.is_empty() {
            b.push_str(&self.schema);
            b.push('.');
        }
        b.push_str(&self.name);
    }

    fn write_joins(&self, b: &mut String) {
        if !self.joins.is_empty() {
            b.push(' ');
            b.push_str(&self.joins);
        }
    }

    fn write_identity_predicate(&self, b: &mut String) {
        let mut index = 0;
        for field in self.fields.iter().filter(|f| f.identity) {
            index += 1;
            if index > 1 {
                b.push_str(" AND ");
            }
            b.push_str(&self.name);
            b.push('.');
            b.push_str(&field.name);
            b.push_str(" = $");
            b.push_str(&index.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use std::collections::BTreeSet;

    type Row = ();

    fn users() -> Table<Row> {
        Table::new("t", vec![
            Field::id("id").bind(5i64),
            Field::column("name").bind("bob"),
        ])
        .build()
        .unwrap()
    }

    /// Distinct `$n` markers in a statement
    fn markers(sql: &str) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        let bytes = sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    found.insert(sql[start..end].parse().unwrap());
                }
                i = end;
            } else {
                i += 1;
            }
        }
        found
    }

    #[test]
    fn test_insert_example() {
        let table = users();
        assert_eq!(
            table.insert_query(),
            "WITH t AS (INSERT INTO t (name) VALUES($1) RETURNING *) SELECT t.id,t.name FROM t"
        );
    }

    #[test]
    fn test_get_and_delete_by_id() {
        let table = users();
        assert_eq!(table.get_by_id_query(), "SELECT t.id,t.name FROM t WHERE t.id = $1");
        assert_eq!(table.delete_by_id_query(), "DELETE FROM t WHERE t.id = $1");
    }

    #[test]
    fn test_update_shares_identity_slot() {
        let table = users();
        assert_eq!(
            table.update_query(),
            "WITH t AS (UPDATE t SET name = $2 WHERE t.id = $1 RETURNING *) SELECT t.id,t.name FROM t"
        );
    }

    #[test]
    fn test_composite_identity_in_declaration_order() {
        let table: Table<Row> = Table::new("membership", vec![
            Field::id("org_id"),
            Field::column("role"),
            Field::id("user_id"),
        ])
        .schema("app")
        .select_columns("membership.*")
        .build()
        .unwrap();

        assert_eq!(
            table.get_by_id_query(),
            "SELECT membership.* FROM app.membership \
             WHERE membership.org_id = $1 AND membership.user_id = $2"
        );
        assert_eq!(
            table.delete_by_id_query(),
            "DELETE FROM app.membership WHERE membership.org_id = $1 AND membership.user_id = $2"
        );
        // role sits between the identity fields but is numbered after them
        assert_eq!(
            table.update_query(),
            "WITH membership AS (UPDATE app.membership SET role = $3 \
             WHERE membership.org_id = $1 AND membership.user_id = $2 RETURNING *) \
             SELECT membership.* FROM membership"
        );
        assert_eq!(
            allocate(table.fields(), Operation::Update),
            vec![Some(1), Some(3), Some(2)]
        );
        assert_eq!(table.selector().query(), "SELECT membership.* FROM app.membership");
    }

    #[test]
    fn test_identity_declared_last() {
        let table: Table<Row> = Table::new("t", vec![Field::column("name"), Field::id("id")])
            .build()
            .unwrap();
        assert_eq!(
            table.update_query(),
            "WITH t AS (UPDATE t SET name = $2 WHERE t.id = $1 RETURNING *) SELECT t.name,t.id FROM t"
        );
        assert_eq!(
            table.insert_query(),
            "WITH t AS (INSERT INTO t (name) VALUES($1) RETURNING *) SELECT t.name,t.id FROM t"
        );
    }

    #[test]
    fn test_upsert_reuses_parameter_index() {
        let table: Table<Row> = Table::new("accounts", vec![
            Field::id("id").insert(VALUE),
            Field::column("email"),
            Field::new("created_at").insert("NOW()"),
            Field::new("updated_at").insert("NOW()").update("NOW()"),
            Field::new("settings").insert("COALESCE({value}, '{}'::jsonb)").update("{value}").bind(serde_json::json!({})),
        ])
        .build()
        .unwrap();

        assert_eq!(
            table.upsert_query(),
            "WITH accounts AS (INSERT INTO accounts (id,email,created_at,updated_at,settings) \
             VALUES($1,$2,NOW(),NOW(),COALESCE($3, '{}'::jsonb)) ON CONFLICT (id) \
             DO UPDATE SET email = $2,updated_at = NOW(),settings = $3 RETURNING *) \
             SELECT accounts.id,accounts.email,accounts.created_at,accounts.updated_at,accounts.settings FROM accounts"
        );
    }

    #[test]
    fn test_insert_marker_count_matches_bound_fields() {
        let fields = vec![
            Field::id("id").insert(VALUE),
            Field::column("a"),
            Field::new("b").insert("lower({value})").bind("x"),
            Field::new("c").insert("NOW()"),
            Field::new("d").update(VALUE).bind(1i32),
        ];
        let table: Table<Row> = Table::new("t", fields.clone());
        let sql = table.generate_insert_query().unwrap();

        let bound_inserts = fields.iter().filter(|f| f.binds() && !f.insert.is_empty()).count();
        assert_eq!(markers(&sql), (1..=bound_inserts).collect());
        assert!(sql.contains("VALUES($1,$2,lower($3),NOW())"));
    }

    #[test]
    fn test_unbound_placeholder_fails() {
        let table: Table<Row> = Table::new("t", vec![Field::id("id"), Field::new("name").insert(VALUE)]);
        assert!(matches!(
            table.generate_insert_query(),
            Err(GenerateError::UnboundPlaceholder { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_joins_and_additional_columns() {
        let owners: Table<Row> = Table::new("owners", vec![
            Field::id("id"),
            Field::new("name").null_default(""),
            Field::new("age").null_default(0i32),
            Field::new("nickname"),
        ]);
        assert_eq!(
            owners.additional_columns(false),
            r#"owners.id AS "owners.id",owners.name AS "owners.name",owners.age AS "owners.age",owners.nickname AS "owners.nickname""#
        );

        let pets: Table<Row> = Table::new("pets", vec![Field::id("id"), Field::column("owner_id")])
            .joins("LEFT JOIN owners ON owners.id = pets.owner_id")
            .select_additional_columns(owners.additional_columns(true))
            .build()
            .unwrap();

        assert_eq!(
            pets.get_by_id_query(),
            "SELECT pets.id,pets.owner_id,COALESCE(owners.id,NULL) AS \"owners.id\",\
             COALESCE(owners.name,'') AS \"owners.name\",COALESCE(owners.age,0) AS \"owners.age\",\
             COALESCE(owners.nickname,NULL) AS \"owners.nickname\" \
             FROM pets LEFT JOIN owners ON owners.id = pets.owner_id WHERE pets.id = $1"
        );
        assert!(pets.insert_query().ends_with(
            "FROM pets LEFT JOIN owners ON owners.id = pets.owner_id"
        ));
        assert!(pets.selector().query().starts_with("SELECT pets.id,pets.owner_id,COALESCE("));
    }

    #[test]
    fn test_select_columns_override() {
        let table: Table<Row> = Table::new("t", vec![Field::id("id"), Field::column("name")])
            .select_columns("t.id,upper(t.name) AS name")
            .build()
            .unwrap();
        assert_eq!(
            table.get_by_id_query(),
            "SELECT t.id,upper(t.name) AS name FROM t WHERE t.id = $1"
        );
        assert_eq!(table.selector().query(), "SELECT t.id,upper(t.name) AS name FROM t");
    }

    #[test]
    fn test_get_by_fields() {
        let table = users();
        assert_eq!(
            table.generate_get_by_fields_query(&["name", "id"]),
            "SELECT t.id,t.name FROM t WHERE t.name = $1 AND t.id = $2"
        );
    }

    #[test]
    fn test_insert_without_columns_uses_defaults() {
        let table: Table<Row> = Table::new("events", vec![Field::id("id")]).build().unwrap();
        assert_eq!(
            table.insert_query(),
            "WITH events AS (INSERT INTO events DEFAULT VALUES RETURNING *) SELECT events.id FROM events"
        );
    }

    #[test]
    fn test_no_update_columns_leaves_update_and_upsert_empty() {
        let table: Table<Row> = Table::new("ev", vec![
            Field::id("id").insert(VALUE),
            Field::new("created_at").insert("NOW()"),
        ]);
        let missing = Err(GenerateError::NoUpdateColumns { table: "ev".to_string() });
        assert_eq!(table.generate_update_query(), missing);
        assert_eq!(table.generate_upsert_query(), missing);

        let table = table.build().unwrap();
        assert!(table.update_query().is_empty());
        assert!(table.upsert_query().is_empty());
        assert_eq!(
            table.insert_query(),
            "WITH ev AS (INSERT INTO ev (id,created_at) VALUES($1,NOW()) RETURNING *) SELECT ev.id,ev.created_at FROM ev"
        );
    }

    #[test]
    fn test_allocation_skips_unreferenced_values() {
        let fields = vec![
            Field::id("id").bind(1i64),
            Field::new("note").bind("unused"),
            Field::column("name"),
        ];
        assert_eq!(allocate(&fields, Operation::Insert), vec![None, None, Some(1)]);
        assert_eq!(allocate(&fields, Operation::Update), vec![Some(1), None, Some(2)]);
        assert_eq!(allocate(&fields, Operation::Upsert), vec![None, None, Some(1)]);
        assert_eq!(allocate(&fields, Operation::GetById), vec![Some(1), None, None]);
    }

    #[test]
    fn test_update_allocates_identity_first() {
        let fields = vec![
            Field::column("a"),
            Field::id("k1"),
            Field::new("note").bind("unused"),
            Field::column("b"),
            Field::id("k2"),
        ];
        assert_eq!(
            allocate(&fields, Operation::Update),
            vec![Some(3), Some(1), None, Some(4), Some(2)]
        );
        // other statements keep declaration order
        assert_eq!(
            allocate(&fields, Operation::Insert),
            vec![Some(1), None, None, Some(2), None]
        );
        assert_eq!(
            allocate(&fields, Operation::DeleteById),
            vec![None, Some(1), None, None, Some(2)]
        );
    }
}
