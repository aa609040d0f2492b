pub mod application;

pub mod consts {
    pub const LABEL_APP: &str = "app";
}
