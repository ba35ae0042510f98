use apigen_core::template::TemplateTable;

macro_rules! builtin {
    ($name:literal) => {
        (
            concat!("server_flask/", $name),
            include_str!(concat!("../templates/server_flask/", $name)),
        )
    };
}

/// Built-in Flask templates, keyed by `server_flask/<file>`.
pub const TEMPLATES: TemplateTable = &[
    builtin!("requirements.j2"),
    builtin!("Dockerfile.j2"),
    builtin!("setup.j2"),
    builtin!("init.j2"),
    builtin!("models_init.j2"),
    builtin!("main.j2"),
    builtin!("util.j2"),
    builtin!("encoder.j2"),
    builtin!("base_model.j2"),
    builtin!("model.j2"),
    builtin!("controller.j2"),
];
