use apigen_core::type_mapper::TypeTable;

/// OpenAPI type/format keys to TypeScript types.
pub const TYPESCRIPT: TypeTable = TypeTable::new(&[
    ("integer", "number"),
    ("int32", "number"),
    ("long", "number"),
    ("int64", "number"),
    ("float", "number"),
    ("double", "number"),
    ("number", "number"),
    ("string", "string"),
    ("byte", "string"),
    ("binary", "string"),
    ("password", "string"),
    ("boolean", "boolean"),
    ("date", "string"),
    ("date-time", "Date"),
    ("object", "any"),
    ("array", "Array"),
    ("<", "<"),
    (">", ">"),
]);
