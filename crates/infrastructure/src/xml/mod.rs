mod translator;

pub use translator::{XML_DECLARATION, XmlTranslator};
