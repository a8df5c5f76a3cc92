/// Where `print` output goes. The core never writes to a UI directly; the
/// host hands a sink in and decides what to do with the lines.
pub trait PrintSink {
    fn print(&self, text: &str);
}

pub struct StdoutSink;

impl PrintSink for StdoutSink {
    fn print(&self, text: &str) {
        println!("{}", text);
    }
}
