/*!

A "logger" that outputs nothing but satisfies the public API. Used when the `logging` feature is
off; whatever logger the application installs receives the messages instead.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Applies the global level to the `log` facade. No logger is installed.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
