use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export;
use crate::state::{AppState, PlotView};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for view in PlotView::ALL {
            if ui.selectable_label(state.view == view, view.label()).clicked() {
                state.view = view;
            }
        }

        ui.separator();

        if !state.files.is_empty() {
            ui.label(format!(
                "{} files loaded, {} ready",
                state.files.len(),
                state.ready_files().len()
            ));
        }

        if ui
            .selectable_label(state.config.export.detail, "Detailed export")
            .clicked()
        {
            state.config.export.detail = !state.config.export.detail;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – file list
// ---------------------------------------------------------------------------

enum FileAction {
    Select(usize),
    Remove(usize),
    SetSegment(usize, usize),
}

/// Render the file registry: one row per file with a delete button, the
/// selectable filename, and the segment selector ("Empty Data" for files
/// that failed to parse).
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Files");
    if let Some(min) = state.min_segment() {
        ui.label(format!("{min} segments shared by all files"));
    }
    ui.separator();

    if state.files.is_empty() {
        ui.label("No files loaded.");
        return;
    }

    let mut action: Option<FileAction> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, file) in state.files.iter().enumerate() {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("Delete").clicked() {
                        action = Some(FileAction::Remove(i));
                    }

                    let text = RichText::new(&file.name)
                        .color(state.color_map.color_for(&file.name));
                    if ui
                        .selectable_label(state.selected_file == Some(i), text)
                        .clicked()
                    {
                        action = Some(FileAction::Select(i));
                    }

                    match file.par() {
                        Some(par) => {
                            egui::ComboBox::from_id_salt(&file.path)
                                .selected_text(format!("Segment #{}", par.selected_segment))
                                .show_ui(ui, |ui: &mut Ui| {
                                    for segment in 0..par.max_segment {
                                        if ui
                                            .selectable_label(
                                                par.selected_segment == segment,
                                                format!("Segment #{segment}"),
                                            )
                                            .clicked()
                                        {
                                            action = Some(FileAction::SetSegment(i, segment));
                                        }
                                    }
                                });
                        }
                        None => {
                            ui.label(RichText::new("Empty Data").italics());
                        }
                    }
                });
            }
        });

    match action {
        Some(FileAction::Select(i)) => state.selected_file = Some(i),
        Some(FileAction::Remove(i)) => state.remove_file(i),
        Some(FileAction::SetSegment(i, segment)) => {
            if let Some(par) = state.files[i].par_mut() {
                par.select_segment(segment);
            }
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let paths = rfd::FileDialog::new()
        .set_title("Open measurement files")
        .add_filter("PAR files", &["par"])
        .pick_files();

    let Some(paths) = paths else {
        return;
    };

    for path in &paths {
        state.add_path(path);
    }
    state.sort_files();
    state.rebuild_color_map();

    let ready = state.ready_files().len();
    log::info!("{ready} of {} loaded files are ready", state.files.len());
    state.status_message = None;
}

pub fn export_dialog(state: &mut AppState) {
    let Some(dir) = rfd::FileDialog::new()
        .set_title("Choose export directory")
        .pick_folder()
    else {
        return;
    };

    let detail = state.config.export.detail;
    let result = {
        let files = state.ready_files();
        export::export_all(&files, &dir, detail)
    };

    match result {
        Ok(()) => {
            log::info!("exported analysis to {}", dir.display());
            state.status_message = None;
            // Keep the detail toggle across sessions.
            if let Err(e) = state.config.save() {
                log::warn!("could not save config: {e:#}");
            }
        }
        Err(e) => {
            log::error!("export failed: {e:#}");
            state.status_message = Some(format!("Export error: {e:#}"));
        }
    }
}
