use log::warn;

use crate::runtime::Error;

///////////////////////////////
/// Number of worker threads to use: as requested, or all available cores
pub fn determine_thread_count(requested: Option<usize>) -> anyhow::Result<usize> {
    if let Some(threads) = requested {
        if threads < 1 {
            return Err(Error::invalid_parameter("threads", "must be at least 1").into());
        }
        return Ok(threads);
    }

    match std::thread::available_parallelism() {
        Ok(total) => Ok(total.get()),
        Err(e) => {
            warn!(
                "Could not autodetect the number of threads available ({}). Setting to 1, but it is better if you specify",
                e
            );
            Ok(1)
        }
    }
}
