use apigen_core::template::TemplateTable;

macro_rules! builtin {
    ($name:literal) => {
        (
            concat!("client_typescript/", $name),
            include_str!(concat!("../templates/client_typescript/", $name)),
        )
    };
}

pub const TEMPLATES: TemplateTable = &[
    builtin!("index.j2"),
    builtin!("variables.j2"),
    builtin!("configuration.j2"),
    builtin!("api_ts.j2"),
    builtin!("models.j2"),
    builtin!("service.j2"),
    builtin!("model.j2"),
];
