mod ctx;

use cloudclub_core_k8s::manager::Ctx;

pub(crate) mod consts {
    pub const NAME: &str = "cloudclub-operator";

    pub const ENV_API_TIMEOUT_SECS: &str = "CLOUDCLUB_API_TIMEOUT_SECS";
    pub const ENV_FIELD_MANAGER: &str = "CLOUDCLUB_FIELD_MANAGER";
}

#[tokio::main]
async fn main() {
    self::ctx::application::Ctx::spawn_crd().await
}
