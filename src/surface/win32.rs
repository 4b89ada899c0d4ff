//! Direct3D 11 surface.
//!
//! Structurally identical to the X11 backend but speaks D3D11/DXGI: a
//! borderless `WS_POPUP` window composed through DirectComposition (the
//! only way to get a true transparent backbuffer on Windows), with
//! `IDXGISwapChain::Present` as the call the injected hook intercepts.
//! Forwarding re-posts the original message to the host HWND.

use super::Surface;
use crate::error::MirrorError;
use crate::event::{EventKind, InputEvent, RawPayload, WindowIdent};
use crate::hotkey::Key;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use windows::core::{w, Interface, PCSTR, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
use windows::Win32::Graphics::Direct3D::{
    ID3DBlob, D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL_10_1, D3D_FEATURE_LEVEL_11_0,
    D3D_FEATURE_LEVEL_11_1, D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::DirectComposition::{
    DCompositionCreateDevice, IDCompositionDevice, IDCompositionTarget, IDCompositionVisual,
};
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, SetFocus, VK_CONTROL, VK_MENU, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::*;

const CLASS_NAME: PCWSTR = w!("OverlayMirrorWindow");

const QUAD_SHADERS: &str = r#"
struct VSIn  { float2 pos : POSITION; float2 tex : TEXCOORD; };
struct VSOut { float4 pos : SV_POSITION; float2 tex : TEXCOORD; };

VSOut VS_Main(VSIn input) {
    VSOut output;
    output.pos = float4(input.pos, 0.0, 1.0);
    output.tex = input.tex;
    return output;
}

Texture2D frame : register(t0);
SamplerState frameSampler : register(s0);

float4 PS_Main(VSOut input) : SV_TARGET {
    return frame.Sample(frameSampler, input.tex);
}
"#;

#[repr(C)]
struct Vertex {
    pos: [f32; 2],
    tex: [f32; 2],
}

const QUAD: [Vertex; 6] = [
    Vertex { pos: [-1.0, 1.0], tex: [0.0, 0.0] },
    Vertex { pos: [1.0, 1.0], tex: [1.0, 0.0] },
    Vertex { pos: [-1.0, -1.0], tex: [0.0, 1.0] },
    Vertex { pos: [1.0, 1.0], tex: [1.0, 0.0] },
    Vertex { pos: [1.0, -1.0], tex: [1.0, 1.0] },
    Vertex { pos: [-1.0, -1.0], tex: [0.0, 1.0] },
];

// Focus changes are sent straight to the window procedure rather than
// posted, so the procedure records them here and `drain_events` picks them
// up on the next frame, keyed by window handle.
static FOCUS_EVENTS: Lazy<Mutex<Vec<(isize, EventKind)>>> = Lazy::new(|| Mutex::new(Vec::new()));

struct FrameTexture {
    texture: ID3D11Texture2D,
    srv: ID3D11ShaderResourceView,
    width: u32,
    height: u32,
}

pub struct Win32Surface {
    hwnd: HWND,
    device: Option<ID3D11Device>,
    context: Option<ID3D11DeviceContext>,
    swap_chain: Option<IDXGISwapChain1>,
    _dcomp_device: Option<IDCompositionDevice>,
    _dcomp_target: Option<IDCompositionTarget>,
    _dcomp_visual: Option<IDCompositionVisual>,
    rtv: Option<ID3D11RenderTargetView>,
    vertex_shader: Option<ID3D11VertexShader>,
    pixel_shader: Option<ID3D11PixelShader>,
    input_layout: Option<ID3D11InputLayout>,
    vertex_buffer: Option<ID3D11Buffer>,
    sampler: Option<ID3D11SamplerState>,
    blend: Option<ID3D11BlendState>,
    texture: Option<FrameTexture>,
    frame: (i32, i32, u32, u32),
    // Modifier state tracked from the message stream itself, so a chord is
    // classified with the state that held when its message was queued, not
    // whatever the keyboard looks like at drain time.
    ctrl_down: bool,
    shift_down: bool,
    alt_down: bool,
    destroyed: bool,
}

unsafe impl Send for Win32Surface {}

impl Win32Surface {
    pub fn new(width: u32, height: u32, title: &str) -> Result<Self, MirrorError> {
        unsafe {
            let hwnd = Self::create_window(width, height, title)?;
            match Self::create_pipeline(hwnd, width, height) {
                Ok(surface) => Ok(surface),
                Err(e) => {
                    let _ = DestroyWindow(hwnd);
                    Err(e)
                }
            }
        }
    }

    unsafe fn create_window(width: u32, height: u32, title: &str) -> Result<HWND, MirrorError> {
        let hinstance = GetModuleHandleW(None)
            .map_err(|e| MirrorError::PlatformInit(format!("GetModuleHandleW: {e}")))?;

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(Self::window_proc),
            hInstance: hinstance.into(),
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        // Re-registering an existing class fails harmlessly; one class
        // serves every mirror window in the process.
        let _ = RegisterClassExW(&wc);

        let mut title_w: Vec<u16> = title.encode_utf16().collect();
        title_w.push(0);

        // Borderless, topmost, invisible to the taskbar and Alt-Tab.
        let hwnd = CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOREDIRECTIONBITMAP,
            CLASS_NAME,
            PCWSTR(title_w.as_ptr()),
            WS_POPUP,
            0,
            0,
            width as i32,
            height as i32,
            None,
            None,
            hinstance,
            None,
        )
        .map_err(|e| MirrorError::PlatformInit(format!("CreateWindowExW: {e}")))?;

        Ok(hwnd)
    }

    unsafe fn create_pipeline(
        hwnd: HWND,
        width: u32,
        height: u32,
    ) -> Result<Self, MirrorError> {
        let init = |e: windows::core::Error, what: &str| {
            MirrorError::PlatformInit(format!("{what}: {e}"))
        };

        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;
        let feature_levels = [
            D3D_FEATURE_LEVEL_11_1,
            D3D_FEATURE_LEVEL_11_0,
            D3D_FEATURE_LEVEL_10_1,
        ];
        D3D11CreateDevice(
            None,
            D3D_DRIVER_TYPE_HARDWARE,
            None,
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            Some(&feature_levels),
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            Some(&mut context),
        )
        .map_err(|e| init(e, "D3D11CreateDevice"))?;
        let device = device.ok_or_else(|| MirrorError::PlatformInit("no D3D11 device".into()))?;
        let context = context.ok_or_else(|| MirrorError::PlatformInit("no D3D11 context".into()))?;

        // Composition swapchain: an HWND swapchain cannot carry an alpha
        // channel, DirectComposition can.
        let dxgi_device: IDXGIDevice = device.cast().map_err(|e| init(e, "IDXGIDevice cast"))?;
        let adapter = dxgi_device.GetAdapter().map_err(|e| init(e, "GetAdapter"))?;
        let factory: IDXGIFactory2 = adapter.GetParent().map_err(|e| init(e, "GetParent"))?;

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width,
            Height: height,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 2,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            AlphaMode: DXGI_ALPHA_MODE_PREMULTIPLIED,
            ..Default::default()
        };
        let swap_chain = factory
            .CreateSwapChainForComposition(&device, &desc, None)
            .map_err(|e| init(e, "CreateSwapChainForComposition"))?;

        let dcomp_device: IDCompositionDevice =
            DCompositionCreateDevice(None).map_err(|e| init(e, "DCompositionCreateDevice"))?;
        let dcomp_target = dcomp_device
            .CreateTargetForHwnd(hwnd, true)
            .map_err(|e| init(e, "CreateTargetForHwnd"))?;
        let dcomp_visual = dcomp_device
            .CreateVisual()
            .map_err(|e| init(e, "CreateVisual"))?;
        dcomp_visual
            .SetContent(&swap_chain)
            .map_err(|e| init(e, "SetContent"))?;
        dcomp_target
            .SetRoot(&dcomp_visual)
            .map_err(|e| init(e, "SetRoot"))?;
        dcomp_device.Commit().map_err(|e| init(e, "Commit"))?;

        let vs_blob = Self::compile(QUAD_SHADERS, "VS_Main", "vs_5_0")?;
        let ps_blob = Self::compile(QUAD_SHADERS, "PS_Main", "ps_5_0")?;
        let vs_bytes = std::slice::from_raw_parts(
            vs_blob.GetBufferPointer() as *const u8,
            vs_blob.GetBufferSize(),
        );
        let ps_bytes = std::slice::from_raw_parts(
            ps_blob.GetBufferPointer() as *const u8,
            ps_blob.GetBufferSize(),
        );

        let mut vertex_shader = None;
        device
            .CreateVertexShader(vs_bytes, None, Some(&mut vertex_shader))
            .map_err(|e| init(e, "CreateVertexShader"))?;
        let mut pixel_shader = None;
        device
            .CreatePixelShader(ps_bytes, None, Some(&mut pixel_shader))
            .map_err(|e| init(e, "CreatePixelShader"))?;

        let input_elements = [
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(b"POSITION\0".as_ptr()),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32_FLOAT,
                InputSlot: 0,
                AlignedByteOffset: 0,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(b"TEXCOORD\0".as_ptr()),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32_FLOAT,
                InputSlot: 0,
                AlignedByteOffset: 8,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
        ];
        let mut input_layout = None;
        device
            .CreateInputLayout(&input_elements, vs_bytes, Some(&mut input_layout))
            .map_err(|e| init(e, "CreateInputLayout"))?;

        let vertex_data = D3D11_SUBRESOURCE_DATA {
            pSysMem: QUAD.as_ptr() as *const _,
            ..Default::default()
        };
        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: std::mem::size_of_val(&QUAD) as u32,
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_VERTEX_BUFFER.0 as u32,
            ..Default::default()
        };
        let mut vertex_buffer = None;
        device
            .CreateBuffer(&buffer_desc, Some(&vertex_data), Some(&mut vertex_buffer))
            .map_err(|e| init(e, "CreateBuffer"))?;

        // Linear, edge-clamped.
        let sampler_desc = D3D11_SAMPLER_DESC {
            Filter: D3D11_FILTER_MIN_MAG_MIP_LINEAR,
            AddressU: D3D11_TEXTURE_ADDRESS_CLAMP,
            AddressV: D3D11_TEXTURE_ADDRESS_CLAMP,
            AddressW: D3D11_TEXTURE_ADDRESS_CLAMP,
            ComparisonFunc: D3D11_COMPARISON_NEVER,
            MaxLOD: f32::MAX,
            ..Default::default()
        };
        let mut sampler = None;
        device
            .CreateSamplerState(&sampler_desc, Some(&mut sampler))
            .map_err(|e| init(e, "CreateSamplerState"))?;

        // Straight alpha: src-alpha, 1 - src-alpha.
        let mut blend_desc = D3D11_BLEND_DESC::default();
        blend_desc.RenderTarget[0] = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: true.into(),
            SrcBlend: D3D11_BLEND_SRC_ALPHA,
            DestBlend: D3D11_BLEND_INV_SRC_ALPHA,
            BlendOp: D3D11_BLEND_OP_ADD,
            SrcBlendAlpha: D3D11_BLEND_ONE,
            DestBlendAlpha: D3D11_BLEND_INV_SRC_ALPHA,
            BlendOpAlpha: D3D11_BLEND_OP_ADD,
            RenderTargetWriteMask: D3D11_COLOR_WRITE_ENABLE_ALL.0 as u8,
        };
        let mut blend = None;
        device
            .CreateBlendState(&blend_desc, Some(&mut blend))
            .map_err(|e| init(e, "CreateBlendState"))?;

        tracing::debug!(hwnd = ?hwnd, width, height, "D3D11 pipeline created");

        Ok(Self {
            hwnd,
            device: Some(device),
            context: Some(context),
            swap_chain: Some(swap_chain),
            _dcomp_device: Some(dcomp_device),
            _dcomp_target: Some(dcomp_target),
            _dcomp_visual: Some(dcomp_visual),
            rtv: None,
            vertex_shader,
            pixel_shader,
            input_layout,
            vertex_buffer,
            sampler,
            blend,
            texture: None,
            frame: (0, 0, width, height),
            ctrl_down: false,
            shift_down: false,
            alt_down: false,
            destroyed: false,
        })
    }

    unsafe fn compile(source: &str, entry: &str, target: &str) -> Result<ID3DBlob, MirrorError> {
        let entry_c = format!("{entry}\0");
        let target_c = format!("{target}\0");
        let mut blob: Option<ID3DBlob> = None;
        let mut errors: Option<ID3DBlob> = None;
        let hr = D3DCompile(
            source.as_ptr() as *const _,
            source.len(),
            PCSTR::null(),
            None,
            None,
            PCSTR(entry_c.as_ptr()),
            PCSTR(target_c.as_ptr()),
            0,
            0,
            &mut blob,
            Some(&mut errors),
        );
        if let Err(e) = hr {
            let detail = errors
                .map(|b| {
                    String::from_utf8_lossy(std::slice::from_raw_parts(
                        b.GetBufferPointer() as *const u8,
                        b.GetBufferSize(),
                    ))
                    .into_owned()
                })
                .unwrap_or_default();
            return Err(MirrorError::PlatformInit(format!(
                "shader compile failed: {e} {detail}"
            )));
        }
        blob.ok_or_else(|| MirrorError::PlatformInit("shader compile produced no blob".into()))
    }

    unsafe extern "system" fn window_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_SETFOCUS => {
                FOCUS_EVENTS.lock().push((hwnd.0 as isize, EventKind::FocusGained));
                LRESULT(0)
            }
            WM_KILLFOCUS => {
                FOCUS_EVENTS.lock().push((hwnd.0 as isize, EventKind::FocusLost));
                LRESULT(0)
            }
            // The backbuffer owns the pixels.
            WM_ERASEBKGND => LRESULT(1),
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }

    fn modifier_down(vk: windows::Win32::UI::Input::KeyboardAndMouse::VIRTUAL_KEY) -> bool {
        unsafe { (GetKeyState(vk.0 as i32) as u16) & 0x8000 != 0 }
    }

    /// Messages arrive in queue order, so replaying modifier ups/downs as
    /// they drain reconstructs the state each key message was typed with.
    fn track_modifiers(&mut self, msg: &MSG) {
        let down = matches!(msg.message, WM_KEYDOWN | WM_SYSKEYDOWN);
        match msg.wParam.0 as u32 {
            vk if vk == VK_CONTROL.0 as u32 => self.ctrl_down = down,
            vk if vk == VK_SHIFT.0 as u32 => self.shift_down = down,
            vk if vk == VK_MENU.0 as u32 => self.alt_down = down,
            _ => {}
        }
    }

    fn sync_modifiers(&mut self) {
        self.ctrl_down = Self::modifier_down(VK_CONTROL);
        self.shift_down = Self::modifier_down(VK_SHIFT);
        self.alt_down = Self::modifier_down(VK_MENU);
    }

    fn translate(&mut self, msg: &MSG) -> Option<InputEvent> {
        let x = (msg.lParam.0 & 0xffff) as i16 as i32;
        let y = ((msg.lParam.0 >> 16) & 0xffff) as i16 as i32;
        let kind = match msg.message {
            WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => {
                self.track_modifiers(msg);
                let key = Key::from_virtual_key(msg.wParam.0 as u32);
                if matches!(msg.message, WM_KEYDOWN | WM_SYSKEYDOWN) {
                    EventKind::KeyDown {
                        key,
                        ctrl: self.ctrl_down,
                        shift: self.shift_down,
                        alt: self.alt_down,
                    }
                } else {
                    EventKind::KeyUp {
                        key,
                        ctrl: self.ctrl_down,
                        shift: self.shift_down,
                        alt: self.alt_down,
                    }
                }
            }
            WM_LBUTTONDOWN => EventKind::ButtonDown { button: 1, x, y },
            WM_LBUTTONUP => EventKind::ButtonUp { button: 1, x, y },
            WM_MBUTTONDOWN => EventKind::ButtonDown { button: 2, x, y },
            WM_MBUTTONUP => EventKind::ButtonUp { button: 2, x, y },
            WM_RBUTTONDOWN => EventKind::ButtonDown { button: 3, x, y },
            WM_RBUTTONUP => EventKind::ButtonUp { button: 3, x, y },
            WM_MOUSEMOVE => EventKind::Motion { x, y },
            _ => return None,
        };
        Some(InputEvent {
            kind,
            raw: RawPayload::Win32 {
                msg: msg.message,
                wparam: msg.wParam.0,
                lparam: msg.lParam.0,
            },
        })
    }

    unsafe fn ensure_rtv(&mut self) -> Option<ID3D11RenderTargetView> {
        if self.rtv.is_none() {
            let (swap_chain, device) = (self.swap_chain.as_ref()?, self.device.as_ref()?);
            let back: ID3D11Texture2D = swap_chain.GetBuffer(0).ok()?;
            let mut rtv = None;
            if device.CreateRenderTargetView(&back, None, Some(&mut rtv)).is_ok() {
                self.rtv = rtv;
            }
        }
        self.rtv.clone()
    }
}

impl Surface for Win32Surface {
    fn show(&mut self) -> Result<(), MirrorError> {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
            let _ = UpdateWindow(self.hwnd);
            // ShowWindow is synchronous for visibility; pump whatever the
            // map generated before the first present.
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            let _ = SetForegroundWindow(self.hwnd);
            let _ = SetFocus(self.hwnd);
        }
        Ok(())
    }

    fn hide(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
    }

    fn set_frame(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let resized = self.frame.2 != width || self.frame.3 != height;
        self.frame = (x, y, width, height);
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                None,
                x,
                y,
                width as i32,
                height as i32,
                SWP_NOZORDER | SWP_NOACTIVATE,
            );
            if resized {
                // The swapchain buffers must track the window, and the old
                // RTV pins them.
                self.rtv = None;
                if let Some(sc) = &self.swap_chain {
                    if let Err(e) =
                        sc.ResizeBuffers(0, width, height, DXGI_FORMAT_UNKNOWN, DXGI_SWAP_CHAIN_FLAG(0))
                    {
                        tracing::warn!(error = %e, "swapchain resize failed");
                    }
                }
            }
        }
    }

    fn frame(&self) -> (i32, i32, u32, u32) {
        self.frame
    }

    fn bind(&mut self) -> Result<(), MirrorError> {
        // D3D11 has no make-current; the equivalent health check is whether
        // the device has been removed out from under us.
        if let Some(device) = &self.device {
            let reason = unsafe { device.GetDeviceRemovedReason() };
            if let Err(e) = reason {
                return Err(MirrorError::ContextBind(format!("device removed: {e}")));
            }
        }
        Ok(())
    }

    fn upload(&mut self, buffer: &[u8], width: u32, height: u32) {
        let (Some(device), Some(context)) = (self.device.clone(), self.context.clone()) else {
            return;
        };
        unsafe {
            let realloc = match &self.texture {
                Some(t) => t.width != width || t.height != height,
                None => true,
            };
            if realloc {
                self.texture = None;
                let desc = D3D11_TEXTURE2D_DESC {
                    Width: width,
                    Height: height,
                    MipLevels: 1,
                    ArraySize: 1,
                    Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                    SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                    Usage: D3D11_USAGE_DYNAMIC,
                    BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
                    CPUAccessFlags: D3D11_CPU_ACCESS_WRITE.0 as u32,
                    ..Default::default()
                };
                let mut texture = None;
                if let Err(e) = device.CreateTexture2D(&desc, None, Some(&mut texture)) {
                    tracing::warn!(error = %e, width, height, "frame texture allocation failed");
                    return;
                }
                let Some(texture) = texture else { return };
                let mut srv = None;
                if let Err(e) = device.CreateShaderResourceView(&texture, None, Some(&mut srv)) {
                    tracing::warn!(error = %e, "shader resource view creation failed");
                    return;
                }
                let Some(srv) = srv else { return };
                self.texture = Some(FrameTexture { texture, srv, width, height });
                tracing::debug!(width, height, "frame texture (re)allocated");
            }

            let Some(t) = &self.texture else { return };
            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            if context
                .Map(&t.texture, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))
                .is_err()
            {
                return;
            }
            let row_bytes = width as usize * 4;
            let src = buffer.as_ptr();
            let dst = mapped.pData as *mut u8;
            for row in 0..height as usize {
                std::ptr::copy_nonoverlapping(
                    src.add(row * row_bytes),
                    dst.add(row * mapped.RowPitch as usize),
                    row_bytes,
                );
            }
            context.Unmap(&t.texture, 0);
        }
    }

    fn texture_size(&self) -> Option<(u32, u32)> {
        self.texture.as_ref().map(|t| (t.width, t.height))
    }

    fn draw_frame(&mut self) {
        unsafe {
            let Some(rtv) = self.ensure_rtv() else { return };
            let Some(context) = self.context.clone() else { return };

            context.ClearRenderTargetView(&rtv, &[0.0, 0.0, 0.0, 0.0]);

            let Some(t) = &self.texture else { return };

            let viewport = D3D11_VIEWPORT {
                TopLeftX: 0.0,
                TopLeftY: 0.0,
                Width: self.frame.2 as f32,
                Height: self.frame.3 as f32,
                MinDepth: 0.0,
                MaxDepth: 1.0,
            };
            context.RSSetViewports(Some(&[viewport]));
            context.OMSetRenderTargets(Some(&[Some(rtv)]), None);
            context.OMSetBlendState(self.blend.as_ref(), None, u32::MAX);
            context.IASetInputLayout(self.input_layout.as_ref());
            context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            let stride = std::mem::size_of::<Vertex>() as u32;
            let offset = 0u32;
            context.IASetVertexBuffers(
                0,
                1,
                Some(&self.vertex_buffer.clone()),
                Some(&stride),
                Some(&offset),
            );
            context.VSSetShader(self.vertex_shader.as_ref(), None);
            context.PSSetShader(self.pixel_shader.as_ref(), None);
            context.PSSetShaderResources(0, Some(&[Some(t.srv.clone())]));
            context.PSSetSamplers(0, Some(&[self.sampler.clone()]));
            context.Draw(QUAD.len() as u32, 0);
        }
    }

    fn present(&mut self) {
        if let Some(sc) = &self.swap_chain {
            let hr = unsafe { sc.Present(1, DXGI_PRESENT(0)) };
            if hr.is_err() {
                tracing::debug!(hr = ?hr, "present failed");
            }
        }
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        // Focus transitions captured by the window procedure first, so the
        // bridge sees lost-then-gained in arrival order.
        {
            let mut pending = FOCUS_EVENTS.lock();
            let own = self.hwnd.0 as isize;
            pending.retain(|(hwnd, kind)| {
                if *hwnd == own {
                    out.push(InputEvent::synthetic(*kind));
                    false
                } else {
                    true
                }
            });
        }
        // Modifiers may have changed while another window had focus and
        // their transitions went elsewhere.
        if out
            .iter()
            .any(|ev| ev.kind == EventKind::FocusGained)
        {
            self.sync_modifiers();
        }
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                if let Some(ev) = self.translate(&msg) {
                    out.push(ev);
                } else {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
        out
    }

    fn forward_event(&mut self, target: WindowIdent, ev: &InputEvent) {
        let RawPayload::Win32 { msg, wparam, lparam } = ev.raw else {
            return;
        };
        unsafe {
            let hwnd = HWND(target.0 as *mut core::ffi::c_void);
            if let Err(e) = PostMessageW(hwnd, msg, WPARAM(wparam), LPARAM(lparam)) {
                tracing::debug!(error = %e, "forward failed");
            }
        }
    }

    fn request_focus(&mut self) {
        unsafe {
            let _ = SetForegroundWindow(self.hwnd);
            let _ = SetFocus(self.hwnd);
        }
    }

    fn tag_app_id(&mut self, app_id: u32) {
        // The hook on this platform identifies the process, not the window;
        // keep the id visible for diagnostics.
        tracing::debug!(app_id, "app id noted (process-scoped hook)");
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        // Texture, then the D3D objects, then the window.
        self.texture = None;
        self.rtv = None;
        self.vertex_shader = None;
        self.pixel_shader = None;
        self.input_layout = None;
        self.vertex_buffer = None;
        self.sampler = None;
        self.blend = None;
        self._dcomp_visual = None;
        self._dcomp_target = None;
        self._dcomp_device = None;
        self.swap_chain = None;
        if let Some(context) = self.context.take() {
            unsafe { context.ClearState() };
        }
        self.device = None;
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
        FOCUS_EVENTS.lock().retain(|(hwnd, _)| *hwnd != self.hwnd.0 as isize);
    }

    fn native_id(&self) -> u64 {
        self.hwnd.0 as u64
    }
}
