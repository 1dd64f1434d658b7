//! Normalised names for logged instrument variables.
//!
//! Titles are matched case-insensitively against fixed tables. The lookup
//! map is built once per process and never mutated afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Source group an instrument variable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableGroup {
    /// Pulse programmer settings (title contains `PPG`).
    Ppg,
    /// CAMP slow-control readings (title starts with `/`).
    Camp,
    /// EPICS beamline readings (everything else).
    Epics,
}

const PPG_NAMES: &[(&str, &str)] = &[
    ("e20 beam on dwelltimes", "beam_on"),
    ("e00 beam on dwelltimes", "beam_on"),
    ("e20  beam off dwelltimes", "beam_off"),
    ("e20 beam off dwelltimes", "beam_off"),
    ("e00 beam off dwelltimes", "beam_off"),
    ("beam off time (ms)", "beam_off_ms"),
    ("constant time between cycles", "const_t_btwn_cycl"),
    ("e1f const time between cycles", "const_t_btwn_cycl"),
    ("Custom var enabled", "customv_enable"),
    ("Custom var read name", "customv_name_read"),
    ("Custom var write name", "customv_name_write"),
    ("Start custom scan", "customv_scan_start"),
    ("Stop custom scan", "customv_scan_stop"),
    ("Custom Increment", "customv_scan_incr"),
    ("DAQ drives sampleref", "smpl_ref_daq_drive"),
    ("DAQ service time (ms)", "service_t"),
    ("Dwell time (ms)", "dwelltime"),
    ("Bin width (ms)", "dwelltime"),
    ("Enable helicity flipping", "hel_enable"),
    ("Enable RF", "rf_enable"),
    ("enable sampleref mode", "smpl_ref_enable"),
    ("Field start (Gauss)", "field_start"),
    ("Field stop (Gauss)", "field_stop"),
    ("Field inc (Gauss)", "field_incr"),
    ("frequency increment (Hz)", "freq_incr"),
    ("frequency start (Hz)", "freq_start"),
    ("frequency stop (Hz)", "freq_stop"),
    ("init mode file", "init_mode"),
    ("init mode", "init_mode"),
    ("helicity flip sleep (ms)", "hel_sleep"),
    ("Helicity flip sleep(ms)", "hel_sleep"),
    ("NaVolt start (volts)", "volt_start"),
    ("NaVolt stop (volts)", "volt_stop"),
    ("NaVolt inc (volts)", "volt_incr"),
    ("num bins", "nbins"),
    ("num cycles per supercycle", "ncycles"),
    ("Number dwelltimes per freq", "ndwell_per_f"),
    ("number of midbnmr regions", "nregion"),
    ("num post RF beamOn dwelltimes", "ndwell_post_on"),
    ("Param X Start", "xstart"),
    ("Param X Stop", "xstop"),
    ("Param X Incr", "xincr"),
    ("Constant param Y", "yconst"),
    ("f1 frequency function", "freqfn_f1"),
    ("f2 frequency function", "freqfn_f2"),
    ("f3 frequency function", "freqfn_f3"),
    ("f4 frequency function", "freqfn_f4"),
    ("PPG mode", "mode"),
    ("e20 prebeam dwelltimes", "prebeam"),
    ("e00 prebeam dwelltimes", "prebeam"),
    ("psm onef enabled", "onef_enable"),
    ("psm onef scale factor", "onef_scale"),
    ("psm fREF enabled", "fref_enable"),
    ("psm fREF scale factor", "fref_scale"),
    ("psm scale factor", "psm_scale"),
    ("psm scaler factor", "psm_scale"),
    ("randomize freq increments", "rand_freq_incr"),
    ("Randomize freq values", "rand_freq_val"),
    ("Ref tuning freq (Hz)", "ref_tune_freq"),
    ("Ref tuning frequency (Hz)", "ref_tune_freq"),
    ("e20 rf frequency (Hz)", "freq"),
    ("e00 rf frequency (Hz)", "freq"),
    ("RFon delay (dwelltimes)", "rf_on_delay"),
    ("num RF on delays (dwell times)", "rf_on_delay"),
    ("RFon duration (dwelltimes)", "rf_on"),
    ("RF on time (ms)", "rf_on_ms"),
    ("RF enabled", "rf_enable"),
    ("Single tone simulated", "sgle_tone_sim"),
    ("use defaults for midbnmr", "defaults"),
];

const CAMP_NAMES: &[(&str, &str)] = &[
    ("/biasV/input1", "rb_cell_bias_set"),
    ("/biasV/output1", "rb_cell_bias_read"),
    ("/CryoEx_MassFlow/read_flow", "cryo_read"),
    ("/CryoEx_MassFlow/set_flow", "cryo_set"),
    ("/Cryo_level/He_level", "cryo_he"),
    ("/Cryo_level/N2_level", "cryo_n2"),
    ("/cryo_lift/set_position", "clift_set"),
    ("/cryo_lift/read_position", "clift_read"),
    ("/Cryo_oven/current_read_1", "oven_current"),
    ("/Cryo_oven/output_1/D", "oven_out_d"),
    ("/Cryo_oven/output_1/I", "oven_out_i"),
    ("/Cryo_oven/output_1/P", "oven_out_p"),
    ("/Cryo_oven/read_A", "oven_readA"),
    ("/Cryo_oven/read_B", "oven_readB"),
    ("/Cryo_oven/read_C", "oven_readC"),
    ("/Cryo_oven/read_D", "oven_readD"),
    ("/Cryo_oven/setpoint_1", "oven_set1"),
    ("/Dac0/dac_set", "dac_set"),
    ("/dac/dac_set", "dac_set"),
    ("/Dewar/He_level", "he_level"),
    ("/flow_set/output", "flow_set_out"),
    ("/He_flow/read_flow", "he_read"),
    ("/He_flow/set_flow", "he_set"),
    ("/lock-in/R", "lockin_r"),
    ("/lock-in/theta", "lockin_theta"),
    ("/lock-in/X", "lockin_x"),
    ("/lock-in/Y", "lockin_y"),
    ("/Magnet/mag_field", "b_field"),
    ("/Magnet/mag_set", "b_field_setpt"),
    ("/Magnet/mag_read", "mag_current"),
    ("/Magnet/controls/sys_status", "mag_ctrl_status"),
    ("/Magnet/volts", "mag_voltage"),
    ("/mass_flow/read_flow", "mass_read"),
    ("/mass_flow/set_flow", "mass_set"),
    ("/needle-valve/read_position", "needle_read"),
    ("/Needle/read_position", "needle_pos"),
    ("/Needle/motor_position", "needle_pos"),
    ("/needle-valve/set_position", "needle_set"),
    ("/Needle_Valve/set_position", "needle_set"),
    ("/Needle/set_position", "needle_set"),
    ("/PVac/adc_read", "vac"),
    ("/rfamp/fwd_max", "rfamp_fwd"),
    ("/rfamp/fwd_power", "rfamp_fpwr"),
    ("/rfamp/refl_max", "rfamp_rfl"),
    ("/rfamp/RF_gain", "rfamp_rfgain"),
    ("/rf_level_cont/dac_set", "rf_dac"),
    ("/Sample/current_read_1", "smpl_current"),
    ("/Sample/current_read", "smpl_current"),
    ("/Sample1/current_read", "smpl_current"),
    ("/Sample/read_A", "smpl_read_A"),
    ("/Sample1/read_A", "smpl_read_A"),
    ("/Sample/read_B", "smpl_read_B"),
    ("/Sample1/read_B", "smpl_read_B"),
    ("/adc0/adc_read", "smpl_read_B"),
    ("/Sample/read_C", "smpl_read_C"),
    ("/Sample/read_D", "smpl_read_D"),
    ("/Sample/set_current", "smpl_set_current"),
    ("/Sample/setpoint", "smpl_set"),
    ("/Sample1/setpoint", "smpl_set"),
    ("/Sample/setpoint_1", "smpl_set"),
    ("/sample2/heat_range", "smpl2_heat"),
    ("/sample2/sample_read", "smpl2_read"),
    ("/sample_volts/reading", "smpl_volts"),
    ("/Shield/read_1", "shield_read1"),
    ("/signal_gen/amplitude", "sig_gen_amp"),
    ("/signal_gen/frequency", "sig_gen_freq"),
    ("/signal_gen/power_level", "sig_gen_pwr"),
    ("/signal_gen/rf_on", "sig_gen_rfon"),
    ("/stealth/fwd_max", "stealth_fwd_max"),
    ("/stealth/fwd_power", "stealth_fwd_pwr"),
    ("/stealth/rev_max", "stealth_rev_max"),
    ("/stealth/rev_power", "stealth_rev_pwr"),
];

const EPICS_NAMES: &[(&str, &str)] = &[
    ("BNMR:HVBIAS:P", "nmr_bias"),
    ("BNMR:HVBIAS:PO", "nmr_bias"),
    ("BNMR:HVBIAS:POS", "nmr_bias"),
    ("BNMR:HVBIAS:POS:", "nmr_bias"),
    ("BNMR:HVBIAS:POS:R", "nmr_bias"),
    ("BNMR:HVBIAS:POS:RDVO", "nmr_bias"),
    ("BNMR:HVBIAS:POS:RDVOL", "nmr_bias"),
    ("BNMR:HVBIAS:POS:RDVOL1", "nmr_bias"),
    ("BNMR:HVBIAS:N", "nmr_bias_n"),
    ("BNMR:HVBIAS:NE", "nmr_bias_n"),
    ("BNMR:HVBIAS:NEG", "nmr_bias_n"),
    ("BNMR:HVBIAS:NEG:", "nmr_bias_n"),
    ("BNMR:HVBIAS:NEG:R", "nmr_bias_n"),
    ("BNMR:HVBIAS:NEG:RDVO", "nmr_bias_n"),
    ("BNMR:HVBIAS:NEG:RDVOL", "nmr_bias_n"),
    ("BNMR:HVBIAS:NEG:RDVOL1", "nmr_bias_n"),
    ("BNQR:HVBIAS:RD", "nqr_bias"),
    ("BNQR:HVBIAS:RDVOL", "nqr_bias"),
    ("ITE:BIAS:RDVO", "target_bias"),
    ("ITE:BIAS:RDVOL", "target_bias"),
    ("ITE:BIAS:RDVOLER", "target_bias"),
    ("ITE:BIAS:RDVOLVOL", "target_bias"),
    ("ITW:BIAS:R", "target_bias"),
    ("ITW:BIAS:RD", "target_bias"),
    ("ITW:BIAS:RDV", "target_bias"),
    ("ITW:BIAS:RDVO", "target_bias"),
    ("ITW:BIAS:RDVOL", "target_bias"),
    ("ITW:BIAS:RDVOL1", "target_bias"),
    ("ITW:BIAS:RDVOLVOL", "target_bias"),
    ("ILE2:BIAS15:R", "bias15"),
    ("ILE2:BIAS15:RD", "bias15"),
    ("ILE2:BIAS15:RDV", "bias15"),
    ("ILE2:BIAS15:RDVO", "bias15"),
    ("ILE2:BIAS15:RDVOL", "bias15"),
    ("ILE2:LAS:RDPO", "las_pwr"),
    ("ILE2:LAS:RDPOW", "las_pwr"),
    ("ILE2:LAS:RDPOWE", "las_pwr"),
    ("ILE2:LAS:RDPOWER", "las_pwr"),
    ("ILE2:LAS:RDPOWERL", "las_pwr"),
    ("ILE2:BIASTUBE:", "biastube"),
    ("ILE2:BIASTUBE:V", "biastube"),
    ("ILE2:BIASTUBE:VOL", "biastube"),
    ("ILE2:DPPLR:CH0:HW:RDVOL", "dopplertube"),
    ("ILE2A1:HH:CUR", "hh_current"),
    ("ILE2A1:HH:RDCU", "hh_current"),
    ("ILE2A1:HH:RDCUR", "hh_current"),
    ("ILE2A1:HH3:RDCUR", "hh_current"),
];

type NameTable = HashMap<String, &'static str>;

fn build(entries: &[(&'static str, &'static str)]) -> NameTable {
    entries
        .iter()
        .map(|(title, key)| (title.to_lowercase(), *key))
        .collect()
}

fn tables() -> &'static [NameTable; 3] {
    static TABLES: OnceLock<[NameTable; 3]> = OnceLock::new();
    TABLES.get_or_init(|| [build(PPG_NAMES), build(CAMP_NAMES), build(EPICS_NAMES)])
}

fn table(group: VariableGroup) -> &'static NameTable {
    let all = tables();
    match group {
        VariableGroup::Ppg => &all[0],
        VariableGroup::Camp => &all[1],
        VariableGroup::Epics => &all[2],
    }
}

/// Decides which group a raw variable title belongs to.
pub fn classify(title: &str) -> VariableGroup {
    if title.contains("PPG") {
        VariableGroup::Ppg
    } else if title.starts_with('/') {
        VariableGroup::Camp
    } else {
        VariableGroup::Epics
    }
}

/// Returns the short key for a raw title, or `None` when the title is not tabulated.
///
/// PPG titles are matched on their last `/`-separated component only.
pub fn normalized_key(title: &str) -> Option<(VariableGroup, &'static str)> {
    let group = classify(title);
    let lookup = match group {
        VariableGroup::Ppg => title.rsplit('/').next().unwrap_or(title),
        VariableGroup::Camp | VariableGroup::Epics => title,
    };
    if lookup.is_empty() {
        return None;
    }
    table(group)
        .get(&lookup.to_lowercase())
        .map(|key| (group, *key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppg_titles_use_last_component() {
        assert_eq!(
            normalized_key("/PPG/PPG20/Dwell time (ms)"),
            Some((VariableGroup::Ppg, "dwelltime"))
        );
        assert_eq!(
            normalized_key("/PPG/PPG20/E20 PREBEAM DWELLTIMES"),
            Some((VariableGroup::Ppg, "prebeam"))
        );
    }

    #[test]
    fn camp_and_epics_are_case_insensitive() {
        assert_eq!(
            normalized_key("/magnet/MAG_FIELD"),
            Some((VariableGroup::Camp, "b_field"))
        );
        assert_eq!(
            normalized_key("ite:bias:rdvol"),
            Some((VariableGroup::Epics, "target_bias"))
        );
        assert_eq!(normalized_key("SOMETHING:ELSE"), None);
        assert_eq!(normalized_key(""), None);
    }
}
