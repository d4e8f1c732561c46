#![forbid(unsafe_code)]

use feedtool::FeedtoolError;

fn main() -> Result<(), FeedtoolError> {
    feedtool::run()
}
