//! Composition of GraphQL query documents from per-view data requirements.
//!
//! Each view declares the fields it renders as a [Selection] through [ViewFragment].
//! [QueryBuilder] nests those selections under the connection a feed paginates,
//! together with the `edges`/`pageInfo` plumbing the merger needs.

use std::fmt::Write;

use itertools::Itertools;

use crate::{
    ConnectionPath,
    connection::{CURSOR, EDGES, NODE, PAGE_INFO},
};

/// Data requirements of a view.
pub trait ViewFragment {
    fn selection() -> Selection;
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Selection {
    fields: Vec<Field>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
struct Field {
    name: String,
    arguments: Vec<(String, String)>,
    selection: Selection,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf field.
    pub fn field(self, name: &str) -> Self {
        self.push_field(name, vec![], Selection::new())
    }

    pub fn fields<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        names.into_iter().fold(self, Self::field)
    }

    /// Add a field with a sub-selection.
    pub fn object(self, name: &str, selection: Selection) -> Self {
        self.push_field(name, vec![], selection)
    }

    /// Add a field with arguments. Argument values are GraphQL source text,
    /// e.g. `$after` or `{ id: $id }`.
    pub fn object_with_args<'a>(
        self,
        name: &str,
        arguments: impl IntoIterator<Item = (&'a str, &'a str)>,
        selection: Selection,
    ) -> Self {
        let arguments = arguments
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.push_field(name, arguments, selection)
    }

    /// Include the data requirements of another view.
    pub fn fragment<F: ViewFragment>(self) -> Self {
        self.merge(F::selection())
    }

    /// Union of two selections.
    ///
    /// Fields with the same name are merged recursively; arguments are unioned,
    /// with arguments of `other` replacing equally named ones.
    pub fn merge(mut self, other: Selection) -> Self {
        for other_field in other.fields {
            match self
                .fields
                .iter_mut()
                .find(|field| field.name == other_field.name)
            {
                Some(field) => {
                    for (name, value) in other_field.arguments {
                        match field.arguments.iter_mut().find(|(arg, _)| *arg == name) {
                            Some(argument) => argument.1 = value,
                            None => field.arguments.push((name, value)),
                        }
                    }
                    let selection = std::mem::take(&mut field.selection);
                    field.selection = selection.merge(other_field.selection);
                }
                None => self.fields.push(other_field),
            }
        }
        self
    }

    fn push_field(self, name: &str, arguments: Vec<(String, String)>, selection: Selection) -> Self {
        self.merge(Selection {
            fields: vec![Field {
                name: name.to_string(),
                arguments,
                selection,
            }],
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn write(&self, out: &mut String, depth: usize) {
        for field in &self.fields {
            let indent = "  ".repeat(depth);
            let _ = write!(out, "{indent}{}", field.name);
            if !field.arguments.is_empty() {
                let _ = write!(
                    out,
                    "({})",
                    field
                        .arguments
                        .iter()
                        .map(|(name, value)| format!("{name}: {value}"))
                        .join(", ")
                );
            }
            if field.selection.is_empty() {
                out.push('\n');
            } else {
                out.push_str(" {\n");
                field.selection.write(out, depth + 1);
                let _ = writeln!(out, "{indent}}}");
            }
        }
    }
}

/// The selection of a connection: edges with cursor and node, and page info.
pub fn connection_selection(node: Selection) -> Selection {
    Selection::new()
        .object(EDGES, Selection::new().field(CURSOR).object(NODE, node))
        .object(
            PAGE_INFO,
            Selection::new().fields(["startCursor", "endCursor", "hasNextPage", "hasPreviousPage"]),
        )
}

pub struct QueryBuilder {
    operation_name: String,
    variables: Vec<(String, String)>,
    root: Selection,
}

impl QueryBuilder {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables: vec![],
            root: Selection::new(),
        }
    }

    /// Declare an operation variable, e.g. `("after", "String")`.
    pub fn variable(mut self, name: &str, ty: &str) -> Self {
        match self.variables.iter_mut().find(|(var, _)| var == name) {
            Some(variable) => variable.1 = ty.to_string(),
            None => self.variables.push((name.to_string(), ty.to_string())),
        }
        self
    }

    /// Add fields at the root of the query.
    pub fn select(mut self, selection: Selection) -> Self {
        self.root = self.root.merge(selection);
        self
    }

    /// Add a paginated connection at `path`, selecting `node` for each node.
    ///
    /// `arguments` are put on the connection field itself. Fields on the way to the
    /// connection that need arguments can be declared with [Self::select] beforehand.
    /// Array index segments of `path` select nothing of their own, a list field's
    /// selection applies to every element.
    pub fn connection<'a>(
        self,
        path: &ConnectionPath,
        arguments: impl IntoIterator<Item = (&'a str, &'a str)>,
        node: Selection,
    ) -> Self {
        let mut segments = path
            .segments()
            .rev()
            .filter(|segment| segment.parse::<usize>().is_err());
        let Some(last) = segments.next() else {
            return self.select(connection_selection(node));
        };

        let leaf = Selection::new().object_with_args(last, arguments, connection_selection(node));
        let nested = segments.fold(leaf, |inner, segment| Selection::new().object(segment, inner));

        self.select(nested)
    }

    /// Add the standard forward pagination arguments (`first`, `after`) on the connection at `path`.
    pub fn paginated_connection(self, path: &ConnectionPath, node: Selection) -> Self {
        self.variable("first", "Int")
            .variable("after", "String")
            .connection(path, [("first", "$first"), ("after", "$after")], node)
    }

    pub fn build(&self) -> String {
        let mut out = format!("query {}", self.operation_name);
        if !self.variables.is_empty() {
            let _ = write!(
                out,
                "({})",
                self.variables
                    .iter()
                    .map(|(name, ty)| format!("${name}: {ty}"))
                    .join(", ")
            );
        }
        out.push_str(" {\n");
        self.root.write(&mut out, 1);
        out.push_str("}\n");
        out
    }
}
