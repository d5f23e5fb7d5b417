use std::path::PathBuf;

use eframe::{egui, Frame};
use egui::Context;
use log::{error, info};

use rs_nextword_core::{ModelStats, NextWordError, PredictorConfig, Session, TextLoader, TrainingReport};

const WELCOME: &str = "Welcome to Next Word Predictor!\nPlease load a text file to train the model.";

/// A training file being read one chunk per frame.
struct PendingLoad {
    loader: TextLoader,
}

/// Global UI state (MUST persist between frames in egui).
struct PredictorUI {
    session: Session,
    pending: Option<PendingLoad>,

    file_path: String,
    file_label: String,
    input: String,
    messages: Vec<String>,
    show_stats: bool,
}

impl PredictorUI {
    fn new() -> Self {
        Self {
            session: Session::new(PredictorConfig::default()),
            pending: None,
            file_path: String::new(),
            file_label: "No file selected".to_owned(),
            input: String::new(),
            messages: vec![WELCOME.to_owned()],
            show_stats: false,
        }
    }

    fn add_message(&mut self, text: impl Into<String>) {
        self.messages.push(text.into());
    }

    /// Opens the file typed in the path box and starts a chunked load.
    fn start_load(&mut self) {
        let path = PathBuf::from(self.file_path.trim());
        if path.as_os_str().is_empty() {
            self.add_message("Enter the path of a text file first.");
            return;
        }

        match TextLoader::open(&path, self.session.config().chunk_size) {
            Ok(loader) => {
                self.file_label = rs_nextword_core::io::file_name(&path);
                self.add_message(format!("Loading file: {}...", self.file_label));
                self.pending = Some(PendingLoad { loader });
            }
            Err(e) => self.load_failed(e),
        }
    }

    /// Reads one chunk of the pending load; trains once the file is fully read.
    fn step_load(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        match pending.loader.read_chunk() {
            Ok(false) => {}
            Ok(true) => {
                if let Some(pending) = self.pending.take() {
                    self.add_message("Training model...");
                    match self.session.train_loader(pending.loader) {
                        Ok(report) => self.training_done(&report),
                        Err(e) => self.load_failed(e),
                    }
                }
            }
            Err(e) => {
                self.pending = None;
                self.load_failed(e);
            }
        }
    }

    fn training_done(&mut self, report: &TrainingReport) {
        info!("ui: trained on {}", report.source.name);
        let stats = &report.stats;
        let message = format!(
            "Training completed!\nFile: {} ({:.1} KB)\nTime: {:.2} seconds\nVocabulary: {} words\nTransitions: {} unique\nRepetition F1: {:.3}\nCompression: {}",
            report.source.name,
            report.source.size_bytes as f64 / 1024.0,
            report.elapsed.as_secs_f64(),
            stats.vocab_size,
            stats.unique_transitions,
            stats.repetition_f1,
            compression_label(stats),
        );
        self.add_message(message);
        if !self.session.is_trained() {
            self.add_message("The file did not contain two consecutive words; the model is still untrained.");
        }
    }

    fn load_failed(&mut self, e: NextWordError) {
        error!("ui: load failed: {e}");
        self.file_label = "Upload failed".to_owned();
        self.add_message(format!("Error: {e}"));
    }

    /// Predicts after the text in the input box and logs the exchange.
    fn process_input(&mut self) {
        let text = self.input.trim().to_owned();
        if text.is_empty() {
            return;
        }
        self.input.clear();
        self.add_message(format!("You: {text}"));

        let start = std::time::Instant::now();
        let reply = match self.session.predict(&text) {
            Ok(words) if words.is_empty() => return,
            Ok(words) => format!(
                "Predictions ({:.3}s):\n  • {}",
                start.elapsed().as_secs_f64(),
                words.join("  • ")
            ),
            Err(NextWordError::NotTrained) => "Please load training data first".to_owned(),
            Err(NextWordError::EmptyPrefix) => return,
            Err(e) => e.to_string(),
        };
        self.add_message(reply);
    }

    fn clear_chat(&mut self) {
        self.messages.clear();
        self.add_message("Chat cleared. Model remains trained.");
    }
}

fn compression_label(stats: &ModelStats) -> String {
    match stats.compression_ratio {
        Some(ratio) => format!("{ratio:.1}x"),
        None => "N/A".to_owned(),
    }
}

fn stats_rows(session: &Session, stats: &ModelStats) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(source) = session.source() {
        rows.push(("Training File:", source.name.clone()));
        rows.push(("File Size:", format!("{:.1} KB", source.size_bytes as f64 / 1024.0)));
    }
    if let Some(report) = session.last_report() {
        rows.push(("Training Time:", format!("{:.2} seconds", report.elapsed.as_secs_f64())));
    }
    rows.push(("Vocabulary Size:", format!("{} words", stats.vocab_size)));
    rows.push(("Unique Transitions:", stats.unique_transitions.to_string()));
    rows.push(("Total Transitions:", stats.total_transitions.to_string()));
    rows.push(("Repetition F1:", format!("{:.3}", stats.repetition_f1)));
    rows.push(("Compression Ratio:", compression_label(stats)));
    rows
}

impl eframe::App for PredictorUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        if self.pending.is_some() {
            self.step_load();
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("upload_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Training file:");
                ui.text_edit_singleline(&mut self.file_path);
                let loading = self.pending.is_some();
                if ui.add_enabled(!loading, egui::Button::new("Load")).clicked() {
                    self.start_load();
                }
                ui.label(&self.file_label);
            });
            if let Some(pending) = &self.pending {
                ui.add(egui::ProgressBar::new(pending.loader.progress()).show_percentage());
            }
        });

        egui::TopBottomPanel::bottom("input_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let response = ui.add(egui::TextEdit::singleline(&mut self.input).desired_width(f32::INFINITY));
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.process_input();
                    response.request_focus();
                }
            });
            ui.horizontal(|ui| {
                if ui.button("Predict Next Word").clicked() {
                    self.process_input();
                }
                if ui.button("Show Statistics").clicked() {
                    if self.session.is_trained() {
                        self.show_stats = true;
                    } else {
                        self.add_message("Please train the model first");
                    }
                }
                if ui.button("Clear Chat").clicked() {
                    self.clear_chat();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for message in &self.messages {
                        ui.label(message);
                        ui.add_space(8.0);
                    }
                });
        });

        if self.show_stats {
            let rows = match self.session.stats() {
                Ok(stats) => stats_rows(&self.session, &stats),
                Err(_) => Vec::new(),
            };
            egui::Window::new("Model Statistics")
                .open(&mut self.show_stats)
                .resizable(false)
                .show(ctx, |ui| {
                    egui::Grid::new("stats_grid").num_columns(2).striped(true).show(ui, |ui| {
                        for (label, value) in &rows {
                            ui.label(*label);
                            ui.strong(value);
                            ui.end_row();
                        }
                    });
                });
        }
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 650.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Next Word Predictor",
        options,
        Box::new(|_| Ok(Box::new(PredictorUI::new()))),
    )
}
