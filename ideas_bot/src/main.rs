use bot_commons::*;

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "WARN,ideas_bot=debug");
    }
    start_everything(ideas_bot::entry());
}
