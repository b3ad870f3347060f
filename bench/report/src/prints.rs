use crate::{report::BenchmarkReport, run_summary::RunSummary, totals_summary::TotalsSummary};
use colored::{Color, Colorize};
use std::fmt::Write;
use tracing::info;

impl BenchmarkReport {
    pub fn print_summary(&self) {
        let params_print = format!(
            "Benchmark: {}, broker: {}, QoS {}, {} messages of {} bytes per publisher, {} messages total\n",
            self.params.format_actors_info(),
            self.params.broker,
            self.params.qos,
            self.params.message_count,
            self.params.message_size,
            self.params.total_messages(),
        )
        .blue();

        info!("{}", params_print);

        for (block, color) in self.summary_blocks() {
            println!("{}", block.color(color));
        }
    }

    /// Every run followed by the totals, each with the color it is printed in.
    fn summary_blocks(&self) -> Vec<(String, Color)> {
        let mut blocks: Vec<(String, Color)> = self
            .runs
            .iter()
            .map(|run| (run.formatted_string(), Color::Green))
            .collect();
        if let Some(totals) = &self.totals {
            blocks.push((totals.formatted_string(self.runs.len()), Color::Red));
        }
        blocks
    }
}

impl RunSummary {
    pub fn formatted_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "======= CLIENT {} =======", self.id);
        let _ = writeln!(
            out,
            "Ratio:                   {:.3} ({}/{})",
            self.ratio(),
            self.successes,
            self.total_messages()
        );
        let _ = writeln!(out, "Runtime (s):             {:.3}", self.run_time);
        let _ = writeln!(out, "Msg time min (us):       {:.3}", self.msg_time_min);
        let _ = writeln!(out, "Msg time max (us):       {:.3}", self.msg_time_max);
        let _ = writeln!(out, "Msg time mean (us):      {:.3}", self.msg_time_mean);
        let _ = writeln!(out, "Msg time std (us):       {:.3}", self.msg_time_std);
        let _ = writeln!(out, " ======");
        let _ = writeln!(out, "Msg del time min (us):   {:.3}", self.msg_del_time_min);
        let _ = writeln!(out, "Msg del time max (us):   {:.3}", self.msg_del_time_max);
        let _ = writeln!(out, "Msg del time mean (us):  {:.3}", self.msg_del_time_mean);
        let _ = writeln!(out, "Msg del time std (us):   {:.3}", self.msg_del_time_std);
        let _ = writeln!(out, "Bandwidth (msg/sec):     {:.3}", self.msgs_per_sec);
        out
    }
}

impl TotalsSummary {
    pub fn formatted_string(&self, runs: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "========= TOTAL ({runs}) =========");
        let _ = writeln!(
            out,
            "Total Ratio:                     {:.3} ({}/{})",
            self.ratio,
            self.successes,
            self.total_messages()
        );
        let _ = writeln!(out, "Total Runtime (sec):             {:.3}", self.total_run_time);
        let _ = writeln!(out, "Average Runtime (sec):           {:.3}", self.avg_run_time);
        let _ = writeln!(out, "Msg time min (us):               {:.3}", self.msg_time_min);
        let _ = writeln!(out, "Msg time max (us):               {:.3}", self.msg_time_max);
        let _ = writeln!(out, "Msg time mean mean (us):         {:.3}", self.msg_time_mean_avg);
        let _ = writeln!(out, "Msg time mean std (us):          {:.3}", self.msg_time_mean_std);
        let _ = writeln!(out, " ======");
        let _ = writeln!(out, "Msg del time min (us):           {:.3}", self.msg_del_time_min);
        let _ = writeln!(out, "Msg del time max (us):           {:.3}", self.msg_del_time_max);
        let _ = writeln!(out, "Msg del time mean mean (us):     {:.3}", self.msg_del_time_mean_avg);
        let _ = writeln!(out, "Msg del time mean std (us):      {:.3}", self.msg_del_time_mean_std);
        let _ = writeln!(out, "Average Bandwidth (msg/sec):     {:.3}", self.avg_msgs_per_sec);
        let _ = writeln!(out, "Total Bandwidth (msg/sec):       {:.3}", self.total_msgs_per_sec);
        out
    }
}
