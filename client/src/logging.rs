/// Routes `log` records to the browser console and installs the panic hook.
///
/// Native hosts bring their own `log` backend; there this is a no-op.
#[cfg(target_arch = "wasm32")]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::log_1(&"console logger already installed".into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init() {}
