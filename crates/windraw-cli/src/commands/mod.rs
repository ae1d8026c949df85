pub mod info;
pub mod probe;

use windraw::Module;

pub(crate) fn module_name(module: Module) -> &'static str {
    match module {
        Module::Core => "core",
        Module::ImageCodec => "image",
        Module::TextLayout => "text",
    }
}
